/*
 * types.rs
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

//! Value types produced by the NNTP engine's parsers. Immutable once built;
//! the engine owns parsing, these are plain data.

use crate::error::NntpError;

/// Whether posting is allowed to a newsgroup. NNTP servers rarely report
/// this reliably outside of LIST, so GROUP always yields `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostingPermission {
    Unknown,
    Permitted,
    Prohibited,
    Moderated,
}

impl PostingPermission {
    fn from_char(c: char) -> Self {
        match c {
            'y' | 'Y' => PostingPermission::Permitted,
            'n' | 'N' => PostingPermission::Prohibited,
            'm' | 'M' => PostingPermission::Moderated,
            _ => PostingPermission::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsgroupInfo {
    pub name: String,
    pub estimated_article_count: u64,
    pub first_article: u64,
    pub last_article: u64,
    pub posting_permission: PostingPermission,
}

impl NewsgroupInfo {
    /// Parse a GROUP reply's text: `<count> <first> <last> <name>`.
    /// Posting permission is not carried by GROUP, so it is always `Unknown`.
    pub fn parse_group_reply(text: &str) -> Result<Self, NntpError> {
        let mut tokens = text.split_whitespace();
        let count: u64 = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| NntpError::Malformed(format!("bad GROUP reply: {text:?}")))?;
        let first: u64 = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| NntpError::Malformed(format!("bad GROUP reply: {text:?}")))?;
        let last: u64 = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| NntpError::Malformed(format!("bad GROUP reply: {text:?}")))?;
        let name = tokens
            .next()
            .ok_or_else(|| NntpError::Malformed(format!("bad GROUP reply: {text:?}")))?
            .to_string();
        Ok(NewsgroupInfo {
            name,
            estimated_article_count: count,
            first_article: first,
            last_article: last,
            posting_permission: PostingPermission::Unknown,
        })
    }

    /// Parse one LIST entry: `<name> <last> <first> <permission-char>`.
    pub fn parse_list_entry(line: &str) -> Result<Self, NntpError> {
        let mut tokens = line.split_whitespace();
        let name = tokens
            .next()
            .ok_or_else(|| NntpError::Malformed(format!("bad LIST entry: {line:?}")))?
            .to_string();
        let last: u64 = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| NntpError::Malformed(format!("bad LIST entry: {line:?}")))?;
        let first: u64 = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| NntpError::Malformed(format!("bad LIST entry: {line:?}")))?;
        let perm_char = tokens
            .next()
            .and_then(|t| t.chars().next())
            .ok_or_else(|| NntpError::Malformed(format!("bad LIST entry: {line:?}")))?;
        let count = if last >= first { last - first + 1 } else { 0 };
        Ok(NewsgroupInfo {
            name,
            estimated_article_count: count,
            first_article: first,
            last_article: last,
            posting_permission: PostingPermission::from_char(perm_char),
        })
    }
}

/// Identifies an article both by its server-local number and (best-effort)
/// message-id, as parsed from an ARTICLE/HEAD/BODY/STAT/LAST/NEXT reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleLocator {
    pub number: u64,
    pub id: String,
}

impl ArticleLocator {
    /// Parse `<number> <message-id>` (the code token already stripped).
    pub fn parse(text: &str) -> Result<Self, NntpError> {
        let mut tokens = text.split_whitespace();
        let number: u64 = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| NntpError::Malformed(format!("bad article pointer: {text:?}")))?;
        let id = tokens
            .next()
            .ok_or_else(|| NntpError::Malformed(format!("bad article pointer: {text:?}")))?
            .to_string();
        Ok(ArticleLocator { number, id })
    }
}

/// Arguments for NEWGROUPS/NEWNEWS: a calendar instant plus optional
/// distribution/newsgroup filters.
#[derive(Debug, Clone)]
pub struct NewGroupsOrNewsQuery {
    /// 6-digit YYMMDD.
    pub date: String,
    /// 6-digit HHMMSS.
    pub time: String,
    pub gmt: bool,
    pub distributions: Option<String>,
    pub newsgroups: Option<String>,
}

impl NewGroupsOrNewsQuery {
    pub fn new(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
            gmt: false,
            distributions: None,
            newsgroups: None,
        }
    }

    /// The `<date> <time>[ GMT][ <<distributions>>]` argument string used by
    /// NEWGROUPS; NEWNEWS prepends the newsgroups list itself.
    pub fn format_date_time_distributions(&self) -> String {
        let mut out = format!("{} {}", self.date, self.time);
        if self.gmt {
            out.push_str(" GMT");
        }
        if let Some(d) = &self.distributions {
            out.push_str(&format!(" <{d}>"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_reply_scenario_parses() {
        let info = NewsgroupInfo::parse_group_reply("104 1 104 alt.example").unwrap();
        assert_eq!(info.estimated_article_count, 104);
        assert_eq!(info.first_article, 1);
        assert_eq!(info.last_article, 104);
        assert_eq!(info.name, "alt.example");
        assert_eq!(info.posting_permission, PostingPermission::Unknown);
    }

    #[test]
    fn list_entry_scenario_parses() {
        let info = NewsgroupInfo::parse_list_entry("alt.example 104 1 m").unwrap();
        assert_eq!(info.name, "alt.example");
        assert_eq!(info.last_article, 104);
        assert_eq!(info.first_article, 1);
        assert_eq!(info.estimated_article_count, 104);
        assert_eq!(info.posting_permission, PostingPermission::Moderated);
    }

    #[test]
    fn newgroups_formats_gmt_and_distributions() {
        let mut q = NewGroupsOrNewsQuery::new("960101", "120000");
        q.gmt = true;
        q.distributions = Some("world,usa".to_string());
        assert_eq!(q.format_date_time_distributions(), "960101 120000 GMT <world,usa>");
    }
}
