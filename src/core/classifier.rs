//! Request classifier that runs the rule sets in priority order.

use http::{HeaderMap, HeaderName, HeaderValue, header::X_CONTENT_TYPE_OPTIONS};
use tracing::{trace, warn};
use uuid::Uuid;

use super::{
    RequestDescriptor, Verdict,
    rules::{
        CatalogError, MatchScope, PatternRuleSet, RuleSetKind, SecurityRule, SecurityViolation,
        SizeLimitRule, catalog,
    },
};
use crate::config::{GuardConfig, RuleSetConfig};

/// Truncate `input` to at most `max_chars` characters for logging.
pub fn truncate_for_log(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}

/// Stateless, reentrant request classifier. Built once from configuration and
/// shared read-only between requests.
pub struct RequestClassifier {
    /// Evaluated in order; the first violation wins
    rules: Vec<Box<dyn SecurityRule>>,
    tracking_header: HeaderName,
    content_type_options: HeaderValue,
    log_truncate_chars: usize,
    enabled: bool,
}

impl RequestClassifier {
    /// Compile every rule set from configuration. Any bad pattern or header
    /// fails here, never during classification.
    pub fn from_config(config: &GuardConfig) -> Result<Self, CatalogError> {
        let mut malicious = PatternRuleSet::new(
            RuleSetKind::Malicious,
            MatchScope::Target,
            config.malicious.enabled,
        )
        .with_decoding(config.malicious.decode_escapes);
        fill_patterns(
            &mut malicious,
            &config.malicious,
            catalog::MALICIOUS_PATTERNS,
        )?;

        let size_limit =
            SizeLimitRule::new(config.size_limit.max_length, config.size_limit.enabled);

        let mut sensitive_paths = PatternRuleSet::new(
            RuleSetKind::SensitivePath,
            MatchScope::Path,
            config.sensitive_paths.enabled,
        )
        .with_decoding(config.sensitive_paths.decode_escapes);
        fill_patterns(
            &mut sensitive_paths,
            &config.sensitive_paths,
            catalog::SENSITIVE_PATH_PATTERNS,
        )?;

        let blocklist = &config.bot_blocklist;
        let mut bots = PatternRuleSet::new(
            RuleSetKind::BotSignature,
            MatchScope::UserAgent,
            blocklist.enabled,
        );
        if blocklist.identifiers.is_empty() {
            for identifier in catalog::BOT_IDENTIFIERS {
                bots.add_literal(identifier)?;
            }
        } else {
            for identifier in &blocklist.identifiers {
                bots.add_literal(identifier)?;
            }
        }
        for identifier in &blocklist.extra_identifiers {
            bots.add_literal(identifier)?;
        }

        let tracking_header = HeaderName::try_from(config.headers.tracking_header.as_str())
            .map_err(|_| CatalogError::InvalidHeaderName(config.headers.tracking_header.clone()))?;
        let content_type_options = HeaderValue::from_str(&config.headers.content_type_options)
            .map_err(|_| CatalogError::InvalidHeaderValue {
                name: X_CONTENT_TYPE_OPTIONS.to_string(),
                value: config.headers.content_type_options.clone(),
            })?;

        Ok(Self {
            rules: vec![
                Box::new(malicious),
                Box::new(size_limit),
                Box::new(sensitive_paths),
                Box::new(bots),
            ],
            tracking_header,
            content_type_options,
            log_truncate_chars: config.log_truncate_chars,
            enabled: config.enabled,
        })
    }

    /// Produce exactly one verdict for `request`.
    pub fn classify(&self, request: &RequestDescriptor) -> Verdict {
        match self.evaluate(request) {
            Some(violation) => {
                self.log_rejection(request, &violation);
                Verdict::Reject(violation.code)
            }
            None => {
                let headers = self.allow_headers();
                trace!(path = request.path(), "Request allowed");
                Verdict::Allow { headers }
            }
        }
    }

    /// The first matching rule set's violation, if any.
    pub fn evaluate(&self, request: &RequestDescriptor) -> Option<SecurityViolation> {
        if !self.enabled {
            return None;
        }

        self.rules
            .iter()
            .filter(|rule| rule.is_enabled())
            .find_map(|rule| rule.check(request).err())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the given rule set will be evaluated.
    pub fn is_rule_set_enabled(&self, kind: RuleSetKind) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.kind() == kind && rule.is_enabled())
    }

    pub fn tracking_header(&self) -> &HeaderName {
        &self.tracking_header
    }

    fn allow_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(2);
        // A hyphenated UUID is always a valid header value.
        if let Ok(request_id) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
            headers.insert(self.tracking_header.clone(), request_id);
        }
        headers.insert(X_CONTENT_TYPE_OPTIONS, self.content_type_options.clone());
        headers
    }

    fn log_rejection(&self, request: &RequestDescriptor, violation: &SecurityViolation) {
        let target = request.target();
        let target = truncate_for_log(&target, self.log_truncate_chars);
        warn!(
            rule_set = violation.rule_set.as_str(),
            signature = %violation.signature,
            status = violation.code.as_u16(),
            threat_level = violation.threat_level.as_str(),
            security_event = violation.rule_set == RuleSetKind::SensitivePath,
            target = ?target,
            "Request rejected"
        );
    }
}

impl Default for RequestClassifier {
    fn default() -> Self {
        Self::from_config(&GuardConfig::default()).expect("shipped catalogs are valid")
    }
}

fn fill_patterns(
    set: &mut PatternRuleSet,
    config: &RuleSetConfig,
    defaults: &[(&str, &str)],
) -> Result<(), CatalogError> {
    if config.patterns.is_empty() {
        for (name, pattern) in defaults {
            set.add_pattern(name, pattern)?;
        }
    } else {
        for pattern in &config.patterns {
            set.add_pattern(pattern, pattern)?;
        }
    }
    for pattern in &config.extra_patterns {
        set.add_pattern(pattern, pattern)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use http::HeaderValue;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::core::RejectCode;

    fn classify(path: &str, query: &str) -> Verdict {
        RequestClassifier::default().classify(&RequestDescriptor::new(
            path,
            query,
            HeaderMap::new(),
        ))
    }

    #[test]
    fn test_shipped_catalogs_compile() {
        let classifier = RequestClassifier::default();
        assert!(classifier.is_rule_set_enabled(RuleSetKind::Malicious));
        assert!(classifier.is_rule_set_enabled(RuleSetKind::SizeLimit));
        assert!(classifier.is_rule_set_enabled(RuleSetKind::SensitivePath));
        assert!(!classifier.is_rule_set_enabled(RuleSetKind::BotSignature));
    }

    #[test]
    fn test_plain_page_is_allowed_with_headers() {
        let verdict = classify("/cars", "");
        let Verdict::Allow { headers } = verdict else {
            panic!("expected allow");
        };
        let request_id = headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .expect("tracking header");
        assert!(Uuid::parse_str(request_id).is_ok());
        assert_eq!(
            headers.get(X_CONTENT_TYPE_OPTIONS),
            Some(&HeaderValue::from_static("nosniff"))
        );
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_malicious_shapes() {
        for (path, query) in [
            ("/../../etc/passwd", ""),
            ("/search", "q=<script>alert(1)</script>"),
            ("/go", "to=JavaScript:alert(1)"),
            ("/img", "x=1&onerror=alert(1)"),
            ("/search", "q=1 UNION SELECT password"),
            ("/search", "q=select name from users"),
            ("/search", "q=insert into users"),
            ("/search", "q=drop table cars"),
            ("/run", "cmd=exec(ls)"),
            ("/run", "cmd=eval(code)"),
            ("/files/..\\windows", ""),
            ("/q", "a=xeval(1)"),
            ("/q", "cmd=_exec(ls)"),
            ("/q", "id=-1union select 1"),
            ("/q", "q=1select name from users"),
            ("/q", "a=1drop table cars"),
            ("/q", "x=1insert into t"),
        ] {
            assert_eq!(
                classify(path, query).reject_code(),
                Some(RejectCode::BadRequest),
                "{path}?{query}"
            );
        }
    }

    #[test]
    fn test_word_boundaries_spare_ordinary_parameters() {
        assert!(classify("/cars", "condition=used&location=denver").is_allowed());
        assert!(classify("/models/executive", "").is_allowed());
    }

    #[test]
    fn test_oversized_target() {
        let query = format!("x={}", "A".repeat(3000));
        assert_eq!(
            classify("/a", &query).reject_code(),
            Some(RejectCode::UriTooLong)
        );
    }

    #[test]
    fn test_malicious_beats_size_limit() {
        let query = format!("q=<script>{}", "A".repeat(3000));
        assert_eq!(
            classify("/a", &query).reject_code(),
            Some(RejectCode::BadRequest)
        );
    }

    #[test]
    fn test_size_limit_beats_sensitive_path() {
        let query = "A".repeat(3000);
        assert_eq!(
            classify("/.env", &query).reject_code(),
            Some(RejectCode::UriTooLong)
        );
    }

    #[test]
    fn test_sensitive_paths() {
        for path in [
            "/.env",
            "/.git/config",
            "/.htaccess",
            "/wp-admin/install.php",
            "/wp-login.php",
            "/phpinfo",
            "/index.php",
            "/default.asp",
            "/default.aspx",
            "/web.config",
        ] {
            assert_eq!(
                classify(path, "").reject_code(),
                Some(RejectCode::NotFound),
                "{path}"
            );
        }
    }

    #[test]
    fn test_sensitive_signature_in_query_is_allowed() {
        assert!(classify("/blog", "topic=.env").is_allowed());
    }

    #[test]
    fn test_bot_blocklist_toggle() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "user-agent",
            HeaderValue::from_static("Mozilla/5.0 (compatible; SemrushBot/7~bl)"),
        );
        let request = RequestDescriptor::new("/cars", "", headers);

        assert!(RequestClassifier::default().classify(&request).is_allowed());

        let config = GuardConfig::builder().bot_blocklist(true).build();
        let classifier = RequestClassifier::from_config(&config).expect("valid config");
        assert_eq!(
            classifier.classify(&request).reject_code(),
            Some(RejectCode::Forbidden)
        );
    }

    #[test]
    fn test_custom_bot_identifier() {
        let config = GuardConfig::builder()
            .bot_blocklist(true)
            .extra_bot_identifier("LotScraper")
            .build();
        let classifier = RequestClassifier::from_config(&config).expect("valid config");
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", HeaderValue::from_static("lotscraper/2.1"));
        let verdict = classifier.classify(&RequestDescriptor::new("/", "", headers));
        assert_eq!(verdict.reject_code(), Some(RejectCode::Forbidden));
    }

    #[test]
    fn test_replacement_catalog() {
        let mut config = GuardConfig::default();
        config.sensitive_paths.patterns = vec![r"^/internal".to_string()];
        let classifier = RequestClassifier::from_config(&config).expect("valid config");

        let internal = RequestDescriptor::new("/internal/report", "", HeaderMap::new());
        assert_eq!(
            classifier.classify(&internal).reject_code(),
            Some(RejectCode::NotFound)
        );
        let dotenv = RequestDescriptor::new("/.env", "", HeaderMap::new());
        assert!(classifier.classify(&dotenv).is_allowed());
    }

    #[test]
    fn test_invalid_pattern_fails_at_build() {
        let config = GuardConfig::builder()
            .extra_malicious_pattern("[unterminated")
            .build();
        assert!(matches!(
            RequestClassifier::from_config(&config),
            Err(CatalogError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_invalid_tracking_header_fails_at_build() {
        let config = GuardConfig::builder().tracking_header("bad header").build();
        assert!(matches!(
            RequestClassifier::from_config(&config),
            Err(CatalogError::InvalidHeaderName(_))
        ));
    }

    #[test]
    fn test_disabled_guard_allows_everything() {
        let config = GuardConfig::builder().enabled(false).build();
        let classifier = RequestClassifier::from_config(&config).expect("valid config");
        let request = RequestDescriptor::new("/.env", "q=<script>", HeaderMap::new());
        assert!(classifier.classify(&request).is_allowed());
    }

    #[test]
    fn test_idempotent_verdicts() {
        let classifier = RequestClassifier::default();
        let request = RequestDescriptor::new("/search", "q=<script>", HeaderMap::new());
        let first = classifier.classify(&request);
        let second = classifier.classify(&request);
        assert_eq!(first.reject_code(), second.reject_code());

        let page = RequestDescriptor::new("/cars", "", HeaderMap::new());
        let (Verdict::Allow { headers: a }, Verdict::Allow { headers: b }) =
            (classifier.classify(&page), classifier.classify(&page))
        else {
            panic!("expected allow");
        };
        assert_ne!(a.get("x-request-id"), b.get("x-request-id"));
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_rejection_log_truncates_target() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();

        let query = format!("x={}", "A".repeat(200));
        let verdict = tracing::subscriber::with_default(subscriber, || {
            classify("/.env", &query)
        });
        assert_eq!(verdict.reject_code(), Some(RejectCode::NotFound));

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("Request rejected").count(), 1);
        // "/.env?x=" is 8 chars, leaving 92 of the 100 for the query
        let kept = format!("/.env?x={}\"", "A".repeat(92));
        assert!(output.contains(&kept), "{output}");
        assert!(!output.contains(&"A".repeat(93)));
        assert!(output.contains("rule_set=\"sensitive_path\""));
        assert!(output.contains("security_event=true"));
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("abcdef", 3), "abc");
        assert_eq!(truncate_for_log("abc", 100), "abc");
        assert_eq!(truncate_for_log("ééé", 2), "éé");
    }
}
