mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use callboard_core::{
    ActivityKind, Alert, AlertFilter, Call, CallFilter, CallboardError, Media, Message,
    MessageFilter, NumberUpdate, Period, PhoneNumber, Recording, Scope,
};

use common::{at, Harness, MockGateway};

mod fanout_tests {
    use super::*;

    #[tokio::test]
    async fn test_calls_merge_newest_first_across_accounts() {
        // The first account answers last; order must not depend on it.
        let harness = Harness::new(vec![
            MockGateway::new("a")
                .with_calls(vec![Call::new("CA_A", "+15550000001", "+15550000002", Some(at(1, 10)))])
                .with_delay(Duration::from_millis(50)),
            MockGateway::new("b")
                .with_calls(vec![Call::new("CA_B", "+15550000003", "+15550000004", Some(at(1, 12)))]),
        ]);

        let calls = harness
            .board
            .fanout
            .list_calls(&Scope::All, &CallFilter::default())
            .await
            .unwrap();

        let got: Vec<(&str, &str)> = calls
            .iter()
            .map(|c| (c.record.sid.as_str(), c.account_id.as_str()))
            .collect();
        assert_eq!(got, vec![("CA_B", "b"), ("CA_A", "a")]);
    }

    #[tokio::test]
    async fn test_equal_timestamps_keep_account_order() {
        let same = Some(at(2, 8));
        let harness = Harness::new(vec![
            MockGateway::new("a")
                .with_messages(vec![Message::new("SM_A", "+1", "+2", same)])
                .with_delay(Duration::from_millis(30)),
            MockGateway::new("b").with_messages(vec![Message::new("SM_B", "+1", "+2", same)]),
        ]);

        let messages = harness
            .board
            .fanout
            .list_messages(&Scope::All, &MessageFilter::default())
            .await
            .unwrap();

        assert_eq!(messages[0].account_id, "a");
        assert_eq!(messages[1].account_id, "b");
    }

    #[tokio::test]
    async fn test_merged_list_is_sorted_descending() {
        let harness = Harness::new(vec![
            MockGateway::new("a").with_alerts(vec![
                Alert::new("NO1", "error", Some(at(3, 1))),
                Alert::new("NO2", "warning", Some(at(5, 1))),
            ]),
            MockGateway::new("b").with_alerts(vec![
                Alert::new("NO3", "error", Some(at(4, 1))),
                Alert::new("NO4", "error", None),
            ]),
        ]);

        let alerts = harness
            .board
            .fanout
            .list_alerts(&Scope::All, &AlertFilter::default())
            .await
            .unwrap();

        let sids: Vec<&str> = alerts.iter().map(|a| a.record.sid.as_str()).collect();
        assert_eq!(sids, vec!["NO2", "NO3", "NO1", "NO4"]);
        for pair in alerts.windows(2) {
            if let (Some(first), Some(second)) = (pair[0].record.date_created, pair[1].record.date_created) {
                assert!(first >= second);
            }
        }
    }

    #[tokio::test]
    async fn test_single_scope_only_touches_that_account() {
        let harness = Harness::new(vec![
            MockGateway::new("a").with_numbers(vec![PhoneNumber::new("PN1", "+15551111111")]),
            MockGateway::new("b").with_numbers(vec![PhoneNumber::new("PN2", "+15552222222")]),
        ]);

        let numbers = harness
            .board
            .fanout
            .list_numbers(&Scope::single("b"), None)
            .await
            .unwrap();

        assert_eq!(numbers.len(), 1);
        assert_eq!(numbers[0].account_id, "b");
        assert_eq!(harness.gateway("a").list_requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_numbers_keep_account_then_upstream_order() {
        let harness = Harness::new(vec![
            MockGateway::new("a")
                .with_numbers(vec![
                    PhoneNumber::new("PN2", "+15552222222"),
                    PhoneNumber::new("PN1", "+15551111111"),
                ])
                .with_delay(Duration::from_millis(20)),
            MockGateway::new("b").with_numbers(vec![PhoneNumber::new("PN3", "+15553333333")]),
        ]);

        let numbers = harness
            .board
            .fanout
            .list_numbers(&Scope::All, None)
            .await
            .unwrap();

        let sids: Vec<&str> = numbers.iter().map(|n| n.record.sid.as_str()).collect();
        assert_eq!(sids, vec!["PN2", "PN1", "PN3"]);
    }

    #[tokio::test]
    async fn test_any_account_failure_fails_the_fanout() {
        let harness = Harness::new(vec![
            MockGateway::new("a").with_calls(vec![Call::new("CA1", "+1", "+2", Some(at(1, 1)))]),
            MockGateway::new("b").failing(),
        ]);

        let err = harness
            .board
            .fanout
            .list_calls(&Scope::All, &CallFilter::default())
            .await
            .unwrap_err();

        match err {
            CallboardError::UpstreamFetchFailed {
                operation,
                account_id,
            } => {
                assert_eq!(operation, "calls");
                assert_eq!(account_id, "b");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_account_is_rejected() {
        let harness = Harness::new(vec![MockGateway::new("a")]);

        let err = harness
            .board
            .fanout
            .list_calls(&Scope::single("ghost"), &CallFilter::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CallboardError::AccountNotFound(id) if id == "ghost"));
        assert_eq!(harness.gateway("a").list_requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_filters_reach_the_gateway() {
        let mut busy = Call::new("CA2", "+1", "+2", Some(at(3, 0)));
        busy.status = "busy".to_string();
        let harness = Harness::new(vec![MockGateway::new("a").with_calls(vec![
            Call::new("CA1", "+1", "+2", Some(at(2, 0))),
            busy,
        ])]);

        let filter = CallFilter {
            status: Some("busy".to_string()),
            ..Default::default()
        };
        let calls = harness
            .board
            .fanout
            .list_calls(&Scope::All, &filter)
            .await
            .unwrap();

        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].record.sid, "CA2");
    }
}

mod lookup_tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_stops_at_first_owner() {
        let harness = Harness::new(vec![
            MockGateway::new("a"),
            MockGateway::new("b").with_calls(vec![Call::new("CA9", "+1", "+2", Some(at(1, 1)))]),
            MockGateway::new("c").with_calls(vec![Call::new("CA9", "+1", "+2", Some(at(1, 1)))]),
        ]);

        let call = harness.board.resolver.call(&Scope::All, "CA9").await.unwrap();

        assert_eq!(call.account_id, "b");
        assert_eq!(harness.fetches("a"), 1);
        assert_eq!(harness.fetches("b"), 1);
        assert_eq!(harness.fetches("c"), 0);
    }

    #[tokio::test]
    async fn test_lookup_skips_accounts_that_error() {
        let harness = Harness::new(vec![
            MockGateway::new("a").failing_fetches(),
            MockGateway::new("b").with_messages(vec![Message::new("SM1", "+1", "+2", Some(at(1, 1)))]),
        ]);

        let message = harness
            .board
            .resolver
            .message(&Scope::All, "SM1")
            .await
            .unwrap();

        assert_eq!(message.account_id, "b");
    }

    #[tokio::test]
    async fn test_lookup_exhausted_is_not_found() {
        let harness = Harness::new(vec![
            MockGateway::new("a"),
            MockGateway::new("b").failing_fetches(),
        ]);

        let err = harness
            .board
            .resolver
            .alert_detail(&Scope::All, "NO404")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CallboardError::ResourceNotFound { ref kind, ref sid } if kind == "Alert" && sid == "NO404"
        ));
        assert_eq!(err.error_code(), "E3002");
    }

    #[tokio::test]
    async fn test_call_detail_uses_owning_account_recordings() {
        let recording = Recording {
            sid: "RE1".to_string(),
            duration: Some(12),
            date_created: Some(at(1, 2)),
            url: "https://api.example.com/Recordings/RE1.mp3".to_string(),
        };
        let harness = Harness::new(vec![
            MockGateway::new("a").with_recordings("CA1", vec![]),
            MockGateway::new("b")
                .with_calls(vec![Call::new("CA1", "+1", "+2", Some(at(1, 1)))])
                .with_recordings("CA1", vec![recording.clone()]),
        ]);

        let detail = harness
            .board
            .resolver
            .call_detail(&Scope::All, "CA1")
            .await
            .unwrap();

        assert_eq!(detail.account_id, "b");
        assert_eq!(detail.record.call.sid, "CA1");
        assert_eq!(detail.record.recordings, vec![recording]);
    }

    #[tokio::test]
    async fn test_message_detail_includes_media() {
        let media = Media {
            sid: "ME1".to_string(),
            content_type: "image/jpeg".to_string(),
            url: "https://api.example.com/Media/ME1".to_string(),
        };
        let harness = Harness::new(vec![MockGateway::new("a")
            .with_messages(vec![Message::new("MM1", "+1", "+2", Some(at(1, 1)))])
            .with_media("MM1", vec![media.clone()])]);

        let detail = harness
            .board
            .resolver
            .message_detail(&Scope::single("a"), "MM1")
            .await
            .unwrap();

        assert_eq!(detail.record.media, vec![media]);
    }

    #[tokio::test]
    async fn test_update_and_release_number() {
        let harness = Harness::new(vec![
            MockGateway::new("a"),
            MockGateway::new("b").with_numbers(vec![PhoneNumber::new("PN1", "+15551111111")]),
        ]);

        let update = NumberUpdate {
            voice_url: Some("https://hooks.example.com/voice".to_string()),
            ..Default::default()
        };
        let updated = harness
            .board
            .numbers
            .update(&Scope::All, "PN1", &update)
            .await
            .unwrap();
        assert_eq!(updated.account_id, "b");
        assert_eq!(
            updated.record.voice_url.as_deref(),
            Some("https://hooks.example.com/voice")
        );

        let owner = harness.board.numbers.release(&Scope::All, "PN1").await.unwrap();
        assert_eq!(owner, "b");
        assert_eq!(*harness.gateway("b").deleted.read().unwrap(), vec!["PN1".to_string()]);

        let again = harness.board.numbers.release(&Scope::All, "PN1").await;
        assert!(matches!(again, Err(CallboardError::ResourceNotFound { .. })));
    }

    #[tokio::test]
    async fn test_empty_update_is_rejected() {
        let harness = Harness::new(vec![MockGateway::new("a")]);

        let err = harness
            .board
            .numbers
            .update(&Scope::All, "PN1", &NumberUpdate::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CallboardError::ValidationError(_)));
        assert_eq!(harness.fetches("a"), 0);
    }
}

mod staleness_tests {
    use super::*;

    #[tokio::test]
    async fn test_unused_number_is_reported_stale() {
        let harness = Harness::new(vec![MockGateway::new("prod")
            .with_numbers(vec![
                PhoneNumber::new("PN1", "+15551234567"),
                PhoneNumber::new("PN2", "+15559999999"),
            ])
            .with_calls(vec![Call::new("CA1", "+15551234567", "+15550000000", Some(at(20, 9)))])]);

        let report = harness
            .board
            .staleness
            .classify_at(&Scope::All, at(30, 0))
            .await
            .unwrap();

        assert_eq!(report.stale_numbers.len(), 1);
        let stale = &report.stale_numbers[0];
        assert_eq!(stale.phone_number, "+15559999999");
        assert_eq!(stale.account_id, "prod");
        assert_eq!(stale.last_activity, None);
        assert!(report.stale_accounts.is_empty());
        assert_eq!(report.summary.total_numbers, 2);
        assert_eq!(report.summary.stale_number_count, 1);
        assert_eq!(report.summary.stale_account_count, 0);
    }

    #[tokio::test]
    async fn test_activity_before_cutoff_does_not_count() {
        // 7 day window for "short": the call on the 1st is outside it.
        let activity = vec![Call::new("CA1", "+15551111111", "+15550000000", Some(at(1, 0)))];
        let harness = Harness::with_stale_days(
            vec![
                MockGateway::new("short")
                    .with_numbers(vec![PhoneNumber::new("PN1", "+15551111111")])
                    .with_calls(activity.clone()),
                MockGateway::new("long")
                    .with_numbers(vec![PhoneNumber::new("PN2", "+15551111111")])
                    .with_calls(activity),
            ],
            &[("short", 7)],
        );

        let report = harness
            .board
            .staleness
            .classify_at(&Scope::All, at(20, 0))
            .await
            .unwrap();

        assert_eq!(report.stale_numbers.len(), 1);
        assert_eq!(report.stale_numbers[0].account_id, "short");
        assert_eq!(report.stale_accounts.len(), 1);
        assert_eq!(report.stale_accounts[0].account_id, "short");
        assert_eq!(report.stale_accounts[0].name, "SHORT");
    }

    #[tokio::test]
    async fn test_account_without_numbers_is_never_stale() {
        let harness = Harness::new(vec![
            MockGateway::new("empty"),
            MockGateway::new("idle").with_numbers(vec![PhoneNumber::new("PN1", "+15551111111")]),
        ]);

        let report = harness
            .board
            .staleness
            .classify_at(&Scope::All, at(30, 0))
            .await
            .unwrap();

        let stale_ids: Vec<&str> = report
            .stale_accounts
            .iter()
            .map(|a| a.account_id.as_str())
            .collect();
        assert_eq!(stale_ids, vec!["idle"]);
    }

    #[tokio::test]
    async fn test_staleness_fails_when_an_account_fails() {
        let harness = Harness::new(vec![MockGateway::new("a"), MockGateway::new("b").failing()]);

        let err = harness
            .board
            .staleness
            .classify(&Scope::All)
            .await
            .unwrap_err();

        assert!(matches!(err, CallboardError::UpstreamFetchFailed { .. }));
    }
}

mod cost_tests {
    use super::*;

    #[tokio::test]
    async fn test_signed_prices_are_summed_as_magnitudes() {
        let harness = Harness::new(vec![MockGateway::new("prod")
            .with_calls(vec![Call::new("CA1", "+1", "+2", Some(at(25, 0))).with_price("-0.0150")])
            .with_messages(vec![Message::new("SM1", "+1", "+2", Some(at(25, 1)))])]);

        let report = harness
            .board
            .costs
            .aggregate_at(&Scope::All, Period::Last30Days, at(30, 0))
            .await
            .unwrap();

        let account = &report.by_account[0];
        assert!((account.calls_cost - 0.015).abs() < 1e-9);
        assert_eq!(account.messages_cost, 0.0);
        assert!((report.total_cost - 0.015).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_totals_are_additive_across_accounts() {
        let harness = Harness::new(vec![
            MockGateway::new("a")
                .with_calls(vec![
                    Call::new("CA1", "+1", "+2", Some(at(20, 0))).with_price("-0.0130"),
                    Call::new("CA2", "+1", "+2", Some(at(21, 0))).with_price("-0.0260"),
                ])
                .with_messages(vec![Message::new("SM1", "+1", "+2", Some(at(21, 0))).with_price("-0.0079")]),
            MockGateway::new("b")
                .with_messages(vec![
                    Message::new("SM2", "+1", "+2", Some(at(22, 0))).with_price("-0.0079"),
                    Message::new("SM3", "+1", "+2", Some(at(22, 0))).with_price("oops"),
                ]),
        ]);

        let report = harness
            .board
            .costs
            .aggregate_at(&Scope::All, Period::Last7Days, at(24, 0))
            .await
            .unwrap();

        let sum_totals: f64 = report.by_account.iter().map(|a| a.total_cost).sum();
        let sum_calls: f64 = report.by_account.iter().map(|a| a.calls_cost).sum();
        let sum_messages: f64 = report.by_account.iter().map(|a| a.messages_cost).sum();

        assert!((report.total_cost - sum_totals).abs() < 1e-9);
        assert!((report.breakdown.calls - sum_calls).abs() < 1e-9);
        assert!((report.breakdown.messages - sum_messages).abs() < 1e-9);
        assert!((report.breakdown.calls - 0.039).abs() < 1e-9);
        assert!((report.breakdown.messages - 0.0158).abs() < 1e-9);
        assert!(report.by_account.iter().all(|a| a.total_cost >= 0.0));
        assert_eq!(report.by_account[0].name, "A");
    }

    #[tokio::test]
    async fn test_window_excludes_old_records() {
        let harness = Harness::new(vec![MockGateway::new("a").with_calls(vec![
            Call::new("CA_OLD", "+1", "+2", Some(at(1, 0))).with_price("-1.00"),
            Call::new("CA_NEW", "+1", "+2", Some(at(28, 0))).with_price("-0.50"),
        ])]);

        let week = harness
            .board
            .costs
            .aggregate_at(&Scope::All, Period::Last7Days, at(30, 0))
            .await
            .unwrap();
        assert!((week.total_cost - 0.5).abs() < 1e-9);

        let all = harness
            .board
            .costs
            .aggregate_at(&Scope::All, Period::AllTime, at(30, 0))
            .await
            .unwrap();
        assert!((all.total_cost - 1.5).abs() < 1e-9);
        assert_eq!(all.period, Period::AllTime);
    }
}

mod dashboard_tests {
    use super::*;

    #[tokio::test]
    async fn test_stats_sum_across_accounts() {
        let harness = Harness::new(vec![
            MockGateway::new("a")
                .with_numbers(vec![PhoneNumber::new("PN1", "+1"), PhoneNumber::new("PN2", "+2")])
                .with_calls(vec![Call::new("CA1", "+1", "+2", Some(at(1, 0)))]),
            MockGateway::new("b")
                .with_numbers(vec![PhoneNumber::new("PN3", "+3")])
                .with_messages(vec![Message::new("SM1", "+1", "+2", Some(at(1, 0)))]),
        ]);

        let stats = harness.board.dashboard.stats(&Scope::All).await.unwrap();

        assert_eq!(stats.numbers, 3);
        assert_eq!(stats.calls, 1);
        assert_eq!(stats.messages, 1);
    }

    #[tokio::test]
    async fn test_activity_feed_is_global_top_ten() {
        let calls = |prefix: &str, hours: std::ops::Range<u32>| {
            hours
                .map(|h| Call::new(&format!("{}{}", prefix, h), "+1", "+2", Some(at(10, h))))
                .collect::<Vec<_>>()
        };
        let harness = Harness::new(vec![
            MockGateway::new("a")
                .with_calls(calls("CA_A", 0..5))
                .with_messages(vec![Message::new("SM_A", "+1", "+2", Some(at(11, 0)))]),
            MockGateway::new("b").with_calls(calls("CA_B", 10..15)),
        ]);

        let feed = harness
            .board
            .dashboard
            .recent_activity(&Scope::All)
            .await
            .unwrap();

        assert_eq!(feed.len(), 10);
        assert_eq!(feed[0].sid, "SM_A");
        assert_eq!(feed[0].kind, ActivityKind::Message);
        assert_eq!(feed[1].sid, "CA_B14");
        assert_eq!(feed[1].account_id, "b");
        for pair in feed.windows(2) {
            assert!(pair[0].date >= pair[1].date);
        }
        assert!(!feed.iter().any(|e| e.sid == "CA_A0"));
    }
}
