/*
 * codes.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Tagliacarte, a cross-platform email client.
 *
 * Tagliacarte is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Tagliacarte is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Tagliacarte.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Named SMTP reply codes (RFC 5321 §4.2).

pub const SERVICE_READY: u16 = 220;
pub const SERVICE_CLOSING: u16 = 221;
pub const ACTION_OK: u16 = 250;
pub const USER_NOT_LOCAL_WILL_FORWARD: u16 = 251;
pub const CANNOT_VRFY_BUT_WILL_ATTEMPT: u16 = 252;
pub const AUTH_SUCCESSFUL: u16 = 235;
pub const AUTH_CONTINUE: u16 = 334;
pub const START_MAIL_INPUT: u16 = 354;
pub const SERVICE_NOT_AVAILABLE: u16 = 421;
pub const AUTH_FAILED: u16 = 535;
