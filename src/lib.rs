// Copyright (c) 2024 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

pub mod config;
pub mod frame_stats;
pub mod sim_clock;
pub mod sky_scene;
