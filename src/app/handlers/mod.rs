// SPDX-License-Identifier: GPL-3.0-only

//! Message handler modules, one per functional domain

mod camera;
mod capture;
mod permissions;
mod playback;
