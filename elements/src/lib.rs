// Copyright (c) 2024 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

pub mod catalog;
pub mod orbital;
pub mod orbital_tables;
pub mod sky_geometry;
pub mod time_util;
