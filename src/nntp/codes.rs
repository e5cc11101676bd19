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

//! Named NNTP reply codes (RFC 977, RFC 2980).

pub const HELP_FOLLOWS: u16 = 100;
pub const CAPABILITY_LIST_FOLLOWS: u16 = 101;
pub const POSTING_ALLOWED_GREETING: u16 = 200;
pub const POSTING_NOT_ALLOWED_GREETING: u16 = 201;
pub const GROUP_SELECTED: u16 = 211;
pub const LIST_FOLLOWS: u16 = 215;
pub const ARTICLE_FOLLOWS: u16 = 220;
pub const HEAD_FOLLOWS: u16 = 221;
pub const BODY_FOLLOWS: u16 = 222;
pub const STAT_REPLY: u16 = 223;
pub const NEW_ARTICLES_FOLLOW: u16 = 230;
pub const NEW_NEWSGROUPS_FOLLOW: u16 = 231;
pub const ARTICLE_TRANSFERRED: u16 = 235;
pub const ARTICLE_POSTED: u16 = 240;
pub const SEND_ARTICLE_FOR_TRANSFER: u16 = 335;
pub const SEND_ARTICLE_TO_POST: u16 = 340;
pub const SERVICE_DISCONTINUED: u16 = 400;
pub const NO_SUCH_NEWSGROUP: u16 = 411;
pub const NO_NEWSGROUP_SELECTED: u16 = 412;
pub const NO_CURRENT_ARTICLE: u16 = 420;
pub const NO_NEXT_ARTICLE: u16 = 421;
pub const NO_PREVIOUS_ARTICLE: u16 = 422;
pub const NO_SUCH_ARTICLE_NUMBER: u16 = 423;
pub const NO_SUCH_ARTICLE_ID: u16 = 430;
pub const ARTICLE_NOT_WANTED: u16 = 435;
pub const TRANSFER_FAILED: u16 = 436;
pub const ARTICLE_REJECTED: u16 = 437;
pub const POSTING_NOT_ALLOWED: u16 = 440;
pub const POSTING_FAILED: u16 = 441;
pub const AUTHENTICATION_ACCEPTED: u16 = 281;
pub const MORE_AUTH_INFO_REQUIRED: u16 = 381;
pub const AUTHENTICATION_REQUIRED: u16 = 480;
pub const AUTHENTICATION_REJECTED: u16 = 482;
