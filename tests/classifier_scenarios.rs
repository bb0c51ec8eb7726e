// Request classification scenarios exercised through the public API
#[cfg(test)]
mod test {
    use http::{HeaderMap, HeaderValue, StatusCode, header::X_CONTENT_TYPE_OPTIONS};
    use showroom_guard::{
        config::GuardConfig,
        core::{RejectCode, RequestClassifier, RequestDescriptor, Verdict},
    };

    fn classify(path: &str, query: &str) -> Verdict {
        RequestClassifier::default().classify(&RequestDescriptor::new(
            path,
            query,
            HeaderMap::new(),
        ))
    }

    #[test]
    fn test_inventory_page_is_allowed() {
        let verdict = classify("/cars", "");
        assert!(verdict.is_allowed());
        assert_eq!(verdict.status(), StatusCode::OK);
    }

    #[test]
    fn test_path_traversal_is_bad_request() {
        assert_eq!(
            classify("/../../etc/passwd", "").reject_code(),
            Some(RejectCode::BadRequest)
        );
    }

    #[test]
    fn test_script_in_query_is_bad_request() {
        assert_eq!(
            classify("/search", "q=<script>alert(1)</script>").reject_code(),
            Some(RejectCode::BadRequest)
        );
    }

    #[test]
    fn test_oversized_query_is_uri_too_long() {
        let query = format!("x={}", "A".repeat(3000));
        let verdict = classify("/a", &query);
        assert_eq!(verdict.reject_code(), Some(RejectCode::UriTooLong));
        assert_eq!(verdict.status().as_u16(), 414);
    }

    #[test]
    fn test_dotenv_probe_is_not_found() {
        assert_eq!(
            classify("/.env", "").reject_code(),
            Some(RejectCode::NotFound)
        );
    }

    #[test]
    fn test_wordpress_probe_is_not_found() {
        assert_eq!(
            classify("/wp-admin/install.php", "").reject_code(),
            Some(RejectCode::NotFound)
        );
    }

    #[test]
    fn test_signatures_are_case_insensitive() {
        for query in [
            "q=<ScRiPt>",
            "u=JAVASCRIPT:void(0)",
            "a=1&OnMouseOver=x",
            "q=Union All Select 1",
            "f=EVAL(x)",
        ] {
            assert_eq!(
                classify("/search", query).reject_code(),
                Some(RejectCode::BadRequest),
                "{query}"
            );
        }
        assert_eq!(
            classify("/WP-LOGIN.PHP", "").reject_code(),
            Some(RejectCode::NotFound)
        );
    }

    #[test]
    fn test_ordinary_dealership_traffic_is_allowed() {
        for (path, query) in [
            ("/", ""),
            ("/inventory", "make=toyota&model=rav4&condition=used"),
            ("/inventory/2021-honda-civic", ""),
            ("/finance/apply", "step=2"),
            ("/contact", "location=downtown"),
            ("/blog/choosing-a-family-suv", "utm_source=newsletter"),
        ] {
            let verdict = classify(path, query);
            let Verdict::Allow { headers } = verdict else {
                panic!("{path}?{query} should be allowed");
            };
            assert_eq!(headers.get_all("x-request-id").iter().count(), 1);
            assert_eq!(
                headers.get(X_CONTENT_TYPE_OPTIONS),
                Some(&HeaderValue::from_static("nosniff"))
            );
        }
    }

    #[test]
    fn test_missing_user_agent_never_errors() {
        let config = GuardConfig::builder().bot_blocklist(true).build();
        let classifier = RequestClassifier::from_config(&config).unwrap();
        let verdict = classifier.classify(&RequestDescriptor::new("/cars", "", HeaderMap::new()));
        assert!(verdict.is_allowed());
    }

    #[test]
    fn test_custom_tracking_header() {
        let config = GuardConfig::builder().tracking_header("X-Trace-Id").build();
        let classifier = RequestClassifier::from_config(&config).unwrap();
        let Verdict::Allow { headers } =
            classifier.classify(&RequestDescriptor::new("/cars", "", HeaderMap::new()))
        else {
            panic!("expected allow");
        };
        assert!(headers.contains_key("x-trace-id"));
        assert!(!headers.contains_key("x-request-id"));
    }

    #[test]
    fn test_decoded_matching_is_opt_in() {
        let descriptor = RequestDescriptor::new("/search", "q=%3Cscript%3E", HeaderMap::new());
        assert!(RequestClassifier::default().classify(&descriptor).is_allowed());

        let mut config = GuardConfig::default();
        config.malicious.decode_escapes = true;
        let classifier = RequestClassifier::from_config(&config).unwrap();
        assert_eq!(
            classifier.classify(&descriptor).reject_code(),
            Some(RejectCode::BadRequest)
        );
    }

    #[test]
    fn test_classifier_is_shareable_across_threads() {
        let classifier = std::sync::Arc::new(RequestClassifier::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let classifier = classifier.clone();
                std::thread::spawn(move || {
                    let request = RequestDescriptor::new("/.git/HEAD", "", HeaderMap::new());
                    classifier.classify(&request).reject_code()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(RejectCode::NotFound));
        }
    }
}
