/*
 * engine.rs
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

//! The NNTP command/reply engine: article retrieval, group selection,
//! listings, posting, AUTHINFO, and XOVER, built atop [`ReplyChannel`] and
//! the dot-stream codec.

use crate::dotstream::{DotStreamReader, DotStreamWriter};
use crate::error::NntpError;
use crate::reply::{Framing, ReplyChannel, ReplyCode};
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

use super::codes;
use super::types::{ArticleLocator, NewGroupsOrNewsQuery, NewsgroupInfo};

/// Which article-retrieval verb to send: selects STAT/ARTICLE/HEAD/BODY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetrieveKind {
    Article,
    Head,
    Body,
    Stat,
}

impl RetrieveKind {
    fn verb(self) -> &'static str {
        match self {
            RetrieveKind::Article => "ARTICLE",
            RetrieveKind::Head => "HEAD",
            RetrieveKind::Body => "BODY",
            RetrieveKind::Stat => "STAT",
        }
    }

    /// Whether a positive-completion reply is followed by a dot-terminated payload.
    fn has_payload(self) -> bool {
        !matches!(self, RetrieveKind::Stat)
    }
}

pub struct NntpEngine<R, W> {
    channel: ReplyChannel<R, W>,
    stream_open: bool,
    posting_allowed: bool,
    capabilities: std::collections::HashSet<String>,
}

impl<R, W> NntpEngine<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            channel: ReplyChannel::new(reader, writer, Framing::SingleLine, codes::SERVICE_DISCONTINUED),
            stream_open: false,
            posting_allowed: false,
            capabilities: std::collections::HashSet::new(),
        }
    }

    /// Read the server greeting (200 posting allowed / 201 posting
    /// prohibited), then privately probe CAPABILITIES to learn whether
    /// STARTTLS/AUTHINFO are available before the caller drives either.
    pub async fn connect_handshake(&mut self) -> Result<ReplyCode, NntpError> {
        let r = self.channel.read_reply().await?;
        self.posting_allowed = r.code.value() == codes::POSTING_ALLOWED_GREETING;
        self.probe_capabilities().await?;
        Ok(r.code)
    }

    /// CAPABILITIES (RFC 3977 §5.2): a server that predates it replies with
    /// an error code (commonly 500), which is not a connection failure —
    /// it just means no extended capability info is available, so callers
    /// fall back to probing STARTTLS/AUTHINFO support by trying them.
    async fn probe_capabilities(&mut self) -> Result<(), NntpError> {
        self.channel.send_command("CAPABILITIES", None, false).await?;
        let r = self.channel.read_reply().await?;
        if r.code.value() != codes::CAPABILITY_LIST_FOLLOWS {
            tracing::debug!("server does not support CAPABILITIES; assuming RFC 977 only");
            return Ok(());
        }
        let mut reader = DotStreamReader::new(self.channel.reader_mut());
        while let Some(line) = reader.read_line().await? {
            if let Some(name) = line.split_whitespace().next() {
                self.capabilities.insert(name.to_ascii_uppercase());
            }
        }
        tracing::debug!(
            starttls = self.supports_starttls(),
            authinfo = self.supports_authinfo(),
            "probed NNTP capabilities"
        );
        Ok(())
    }

    /// Whether the CAPABILITIES probe advertised STARTTLS.
    fn supports_starttls(&self) -> bool {
        self.capabilities.contains("STARTTLS")
    }

    /// Whether the CAPABILITIES probe advertised AUTHINFO.
    fn supports_authinfo(&self) -> bool {
        self.capabilities.contains("AUTHINFO")
    }

    pub fn posting_allowed(&self) -> bool {
        self.posting_allowed
    }

    async fn retrieve(
        &mut self,
        kind: RetrieveKind,
        arg: Option<&str>,
    ) -> Result<(ReplyCode, Option<ArticleLocator>), NntpError> {
        self.channel.send_command(kind.verb(), arg, false).await?;
        let r = self.channel.read_reply().await?;
        if !r.code.is_positive_completion() {
            return Ok((r.code, None));
        }
        let locator = ArticleLocator::parse(r.message())?;
        Ok((r.code, Some(locator)))
    }

    /// ARTICLE by message-id; on success returns the locator and a
    /// dot-stream reader positioned at the start of the article.
    pub async fn retrieve_article_by_id(
        &mut self,
        id: &str,
    ) -> Result<Option<(ArticleLocator, DotStreamReader<'_, R>)>, NntpError> {
        self.retrieve_with_payload(RetrieveKind::Article, Some(id)).await
    }

    pub async fn retrieve_article_by_number(
        &mut self,
        number: u64,
    ) -> Result<Option<(ArticleLocator, DotStreamReader<'_, R>)>, NntpError> {
        let arg = number.to_string();
        self.retrieve_with_payload(RetrieveKind::Article, Some(&arg)).await
    }

    pub async fn retrieve_article_header_by_id(
        &mut self,
        id: &str,
    ) -> Result<Option<(ArticleLocator, DotStreamReader<'_, R>)>, NntpError> {
        self.retrieve_with_payload(RetrieveKind::Head, Some(id)).await
    }

    pub async fn retrieve_article_header_by_number(
        &mut self,
        number: u64,
    ) -> Result<Option<(ArticleLocator, DotStreamReader<'_, R>)>, NntpError> {
        let arg = number.to_string();
        self.retrieve_with_payload(RetrieveKind::Head, Some(&arg)).await
    }

    pub async fn retrieve_article_body_by_id(
        &mut self,
        id: &str,
    ) -> Result<Option<(ArticleLocator, DotStreamReader<'_, R>)>, NntpError> {
        self.retrieve_with_payload(RetrieveKind::Body, Some(id)).await
    }

    pub async fn retrieve_article_body_by_number(
        &mut self,
        number: u64,
    ) -> Result<Option<(ArticleLocator, DotStreamReader<'_, R>)>, NntpError> {
        let arg = number.to_string();
        self.retrieve_with_payload(RetrieveKind::Body, Some(&arg)).await
    }

    async fn retrieve_with_payload(
        &mut self,
        kind: RetrieveKind,
        arg: Option<&str>,
    ) -> Result<Option<(ArticleLocator, DotStreamReader<'_, R>)>, NntpError> {
        debug_assert!(kind.has_payload());
        if self.stream_open {
            return Err(NntpError::StreamAlreadyOpen);
        }
        self.channel.send_command(kind.verb(), arg, false).await?;
        let r = self.channel.read_reply().await?;
        if !r.code.is_positive_completion() {
            return Ok(None);
        }
        let locator = ArticleLocator::parse(r.message())?;
        self.stream_open = true;
        Ok(Some((locator, DotStreamReader::new(self.channel.reader_mut()))))
    }

    /// STAT by message-id; does not move the server's current-article cursor.
    pub async fn select_article_by_id(&mut self, id: &str) -> Result<Option<ArticleLocator>, NntpError> {
        Ok(self.retrieve(RetrieveKind::Stat, Some(id)).await?.1)
    }

    /// STAT by article number; does move the current-article cursor.
    pub async fn select_article_by_number(&mut self, number: u64) -> Result<Option<ArticleLocator>, NntpError> {
        let arg = number.to_string();
        Ok(self.retrieve(RetrieveKind::Stat, Some(&arg)).await?.1)
    }

    /// Bare STAT: report the currently selected article.
    pub async fn select_current_article(&mut self) -> Result<Option<ArticleLocator>, NntpError> {
        Ok(self.retrieve(RetrieveKind::Stat, None).await?.1)
    }

    pub async fn select_previous_article(&mut self) -> Result<Option<ArticleLocator>, NntpError> {
        self.channel.send_command("LAST", None, false).await?;
        let r = self.channel.read_reply().await?;
        if !r.code.is_positive_completion() {
            return Ok(None);
        }
        Ok(Some(ArticleLocator::parse(r.message())?))
    }

    pub async fn select_next_article(&mut self) -> Result<Option<ArticleLocator>, NntpError> {
        self.channel.send_command("NEXT", None, false).await?;
        let r = self.channel.read_reply().await?;
        if !r.code.is_positive_completion() {
            return Ok(None);
        }
        Ok(Some(ArticleLocator::parse(r.message())?))
    }

    /// GROUP: select a newsgroup and report its article range.
    pub async fn select_newsgroup(&mut self, name: &str) -> Result<Option<NewsgroupInfo>, NntpError> {
        self.channel.send_command("GROUP", Some(name), false).await?;
        let r = self.channel.read_reply().await?;
        if !r.code.is_positive_completion() {
            return Ok(None);
        }
        Ok(Some(NewsgroupInfo::parse_group_reply(r.message())?))
    }

    /// LIST: every newsgroup the server carries.
    pub async fn list_newsgroups(&mut self) -> Result<Vec<NewsgroupInfo>, NntpError> {
        self.list_with_verb("LIST", None).await
    }

    /// LIST ACTIVE <wildmat>.
    pub async fn list_newsgroups_matching(&mut self, wildmat: &str) -> Result<Vec<NewsgroupInfo>, NntpError> {
        self.list_with_verb("LIST ACTIVE", Some(wildmat)).await
    }

    async fn list_with_verb(&mut self, verb: &str, arg: Option<&str>) -> Result<Vec<NewsgroupInfo>, NntpError> {
        self.channel.send_command(verb, arg, false).await?;
        let r = self.channel.read_reply().await?;
        if !r.code.is_positive_completion() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        let mut reader = DotStreamReader::new(self.channel.reader_mut());
        while let Some(line) = reader.read_line().await? {
            out.push(NewsgroupInfo::parse_list_entry(&line)?);
        }
        Ok(out)
    }

    /// NEWGROUPS <date> <time>[ GMT][ <<distributions>>].
    pub async fn list_new_newsgroups(&mut self, query: &NewGroupsOrNewsQuery) -> Result<Vec<NewsgroupInfo>, NntpError> {
        let args = query.format_date_time_distributions();
        self.channel.send_command("NEWGROUPS", Some(&args), false).await?;
        let r = self.channel.read_reply().await?;
        if !r.code.is_positive_completion() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        let mut reader = DotStreamReader::new(self.channel.reader_mut());
        while let Some(line) = reader.read_line().await? {
            out.push(NewsgroupInfo::parse_list_entry(&line)?);
        }
        Ok(out)
    }

    /// NEWNEWS <newsgroups> <date> <time>[ GMT][ <<distributions>>].
    pub async fn list_new_news(
        &mut self,
        newsgroups: &str,
        query: &NewGroupsOrNewsQuery,
    ) -> Result<Vec<String>, NntpError> {
        let args = format!("{newsgroups} {}", query.format_date_time_distributions());
        self.channel.send_command("NEWNEWS", Some(&args), false).await?;
        let r = self.channel.read_reply().await?;
        if !r.code.is_positive_completion() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        let mut reader = DotStreamReader::new(self.channel.reader_mut());
        while let Some(line) = reader.read_line().await? {
            out.push(line);
        }
        Ok(out)
    }

    /// POST: on a positive-intermediate reply, return a writer handing the
    /// stream over to the caller for the article body.
    pub async fn post_article(&mut self) -> Result<Option<DotStreamWriter<'_, W>>, NntpError> {
        if self.stream_open {
            return Err(NntpError::StreamAlreadyOpen);
        }
        self.channel.send_command("POST", None, false).await?;
        let r = self.channel.read_reply().await?;
        if !r.code.is_positive_intermediate() {
            return Ok(None);
        }
        self.stream_open = true;
        Ok(Some(DotStreamWriter::new(self.channel.writer_mut())))
    }

    /// IHAVE <id>: same writer-handover contract as `post_article`.
    pub async fn forward_article(&mut self, id: &str) -> Result<Option<DotStreamWriter<'_, W>>, NntpError> {
        if self.stream_open {
            return Err(NntpError::StreamAlreadyOpen);
        }
        self.channel.send_command("IHAVE", Some(id), false).await?;
        let r = self.channel.read_reply().await?;
        if !r.code.is_positive_intermediate() {
            return Ok(None);
        }
        self.stream_open = true;
        Ok(Some(DotStreamWriter::new(self.channel.writer_mut())))
    }

    /// Pull the final reply after the caller closes a handed-over writer
    /// from `post_article`/`forward_article`/a retrieve call.
    pub async fn complete_pending_command(&mut self) -> Result<bool, NntpError> {
        self.stream_open = false;
        let r = self.channel.read_reply().await?;
        Ok(r.code.is_positive_completion())
    }

    /// AUTHINFO USER/PASS. Returns true on 281 (authentication accepted).
    /// The CAPABILITIES probe from `connect_handshake` informs this only as
    /// a log hint: some servers support AUTHINFO without advertising it, so
    /// a negative probe result does not stop the attempt.
    pub async fn authenticate(&mut self, user: &str, password: &str) -> Result<bool, NntpError> {
        if !self.capabilities.is_empty() && !self.supports_authinfo() {
            tracing::debug!("capabilities did not advertise AUTHINFO; attempting anyway");
        }
        self.channel.send_command("AUTHINFO USER", Some(user), false).await?;
        let r = self.channel.read_reply().await?;
        if r.code.value() == codes::AUTHENTICATION_ACCEPTED {
            self.posting_allowed = true;
            return Ok(true);
        }
        if r.code.value() != codes::MORE_AUTH_INFO_REQUIRED {
            return Ok(false);
        }
        self.channel.send_command("AUTHINFO PASS", Some(password), false).await?;
        let r = self.channel.read_reply().await?;
        let ok = r.code.value() == codes::AUTHENTICATION_ACCEPTED;
        if ok {
            self.posting_allowed = true;
        }
        Ok(ok)
    }

    /// XOVER for a single article number.
    pub async fn retrieve_article_info(&mut self, number: u64) -> Result<Option<DotStreamReader<'_, R>>, NntpError> {
        let arg = number.to_string();
        self.retrieve_overview(&arg).await
    }

    /// XOVER for an inclusive range `lo-hi`.
    pub async fn retrieve_article_info_range(&mut self, lo: u64, hi: u64) -> Result<Option<DotStreamReader<'_, R>>, NntpError> {
        let arg = format!("{lo}-{hi}");
        self.retrieve_overview(&arg).await
    }

    async fn retrieve_overview(&mut self, arg: &str) -> Result<Option<DotStreamReader<'_, R>>, NntpError> {
        if self.stream_open {
            return Err(NntpError::StreamAlreadyOpen);
        }
        self.channel.send_command("XOVER", Some(arg), false).await?;
        let r = self.channel.read_reply().await?;
        if !r.code.is_positive_completion() {
            return Ok(None);
        }
        self.stream_open = true;
        Ok(Some(DotStreamReader::new(self.channel.reader_mut())))
    }

    pub async fn quit(&mut self) -> Result<bool, NntpError> {
        self.channel.send_command("QUIT", None, false).await?;
        Ok(self.channel.read_reply().await?.code.is_positive_completion())
    }

    pub fn last_reply_code(&self) -> Option<ReplyCode> {
        self.channel.last_reply_code()
    }

    pub fn last_reply_text(&self) -> &str {
        self.channel.last_reply_text()
    }

    pub fn into_parts(self) -> (BufReader<R>, W) {
        self.channel.into_parts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn group_reply_scenario_end_to_end() {
        let (client, mut server) = duplex(256);
        let (r, w) = tokio::io::split(client);
        let mut engine = NntpEngine::new(r, w);
        tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let _ = server.read(&mut buf).await.unwrap();
            server.write_all(b"211 104 1 104 alt.example\r\n").await.unwrap();
        });
        let info = engine.select_newsgroup("alt.example").await.unwrap().unwrap();
        assert_eq!(info.estimated_article_count, 104);
        assert_eq!(info.first_article, 1);
        assert_eq!(info.last_article, 104);
        assert_eq!(info.name, "alt.example");
    }

    #[tokio::test]
    async fn list_newsgroups_parses_dot_terminated_listing() {
        let (client, mut server) = duplex(512);
        let (r, w) = tokio::io::split(client);
        let mut engine = NntpEngine::new(r, w);
        tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let _ = server.read(&mut buf).await.unwrap();
            server
                .write_all(b"215 list follows\r\nalt.example 104 1 m\r\n.\r\n")
                .await
                .unwrap();
        });
        let groups = engine.list_newsgroups().await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "alt.example");
        assert_eq!(groups[0].estimated_article_count, 104);
    }

    #[tokio::test]
    async fn list_with_zero_groups_is_empty_not_error() {
        let (client, mut server) = duplex(256);
        let (r, w) = tokio::io::split(client);
        let mut engine = NntpEngine::new(r, w);
        tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let _ = server.read(&mut buf).await.unwrap();
            server.write_all(b"215 list follows\r\n.\r\n").await.unwrap();
        });
        let groups = engine.list_newsgroups().await.unwrap();
        assert!(groups.is_empty());
    }

    #[tokio::test]
    async fn authenticate_follows_user_then_pass() {
        let (client, mut server) = duplex(256);
        let (r, w) = tokio::io::split(client);
        let mut engine = NntpEngine::new(r, w);
        tokio::spawn(async move {
            let mut buf = vec![0u8; 128];
            let n = server.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"AUTHINFO USER alice\r\n");
            server.write_all(b"381 more auth info required\r\n").await.unwrap();
            let n = server.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"AUTHINFO PASS hunter2\r\n");
            server.write_all(b"281 authentication accepted\r\n").await.unwrap();
        });
        assert!(engine.authenticate("alice", "hunter2").await.unwrap());
        assert!(engine.posting_allowed());
    }

    #[tokio::test]
    async fn connect_handshake_probes_capabilities_and_detects_starttls() {
        let (client, mut server) = duplex(256);
        let (r, w) = tokio::io::split(client);
        let mut engine = NntpEngine::new(r, w);
        tokio::spawn(async move {
            server.write_all(b"200 posting allowed\r\n").await.unwrap();
            let mut buf = [0u8; 64];
            let n = server.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"CAPABILITIES\r\n");
            server
                .write_all(b"101 capabilities follow\r\nVERSION 2\r\nSTARTTLS\r\nAUTHINFO USER\r\n.\r\n")
                .await
                .unwrap();
        });
        let code = engine.connect_handshake().await.unwrap();
        assert_eq!(code.value(), 200);
        assert!(engine.supports_starttls());
        assert!(engine.supports_authinfo());
    }

    #[tokio::test]
    async fn connect_handshake_tolerates_servers_without_capabilities() {
        let (client, mut server) = duplex(256);
        let (r, w) = tokio::io::split(client);
        let mut engine = NntpEngine::new(r, w);
        tokio::spawn(async move {
            server.write_all(b"200 posting allowed\r\n").await.unwrap();
            let mut buf = [0u8; 64];
            let _ = server.read(&mut buf).await.unwrap();
            server.write_all(b"500 command not recognized\r\n").await.unwrap();
        });
        let code = engine.connect_handshake().await.unwrap();
        assert_eq!(code.value(), 200);
        assert!(!engine.supports_starttls());
        assert!(!engine.supports_authinfo());
    }
}
