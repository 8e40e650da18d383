use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use relay_core::{
    AlertParser, ObjectsLayout, OidResolution, ParserConfig, RelayError, SeverityRanking,
    TemplateService, TrapBuilder, TrapBuilderConfig, TrapClock, TrapSender,
    DEFAULT_DESCRIPTION_TEMPLATE,
};
use relay_metrics::{MetricsCollector, NoopTelemetry, TelemetrySink, TrapOutcome};
use relay_snmp::{
    DestinationProfile, EngineTime, SnmpError, TrapPdu, TrapSession, TrapTransport, UdpTransport,
};
use relay_types::{Alert, AlertBatch};
use tokio::net::UdpSocket;
use tokio_test::{assert_err, assert_ok};

#[derive(Default)]
struct Journal {
    opened: Vec<String>,
    sent: Vec<(String, TrapPdu)>,
    closed: Vec<String>,
}

/// 内存传输：`unreachable` 中的地址无法打开，`failing` 中的地址发送失败
#[derive(Default)]
struct MockTransport {
    unreachable: HashSet<String>,
    failing: HashSet<String>,
    journal: Arc<Mutex<Journal>>,
}

struct MockSession {
    address: String,
    failing: bool,
    journal: Arc<Mutex<Journal>>,
}

#[async_trait]
impl TrapTransport for MockTransport {
    async fn open(&self, profile: Arc<DestinationProfile>) -> relay_snmp::Result<Box<dyn TrapSession>> {
        if self.unreachable.contains(&profile.address) {
            return Err(SnmpError::Resolve(profile.address.clone()));
        }
        self.journal.lock().unwrap().opened.push(profile.address.clone());
        Ok(Box::new(MockSession {
            address: profile.address.clone(),
            failing: self.failing.contains(&profile.address),
            journal: self.journal.clone(),
        }))
    }
}

#[async_trait]
impl TrapSession for MockSession {
    async fn send_trap(&mut self, pdu: &TrapPdu, _engine_time: EngineTime) -> relay_snmp::Result<()> {
        if self.failing {
            return Err(SnmpError::Timeout(self.address.clone()));
        }
        self.journal
            .lock()
            .unwrap()
            .sent
            .push((self.address.clone(), pdu.clone()));
        Ok(())
    }

    async fn close(&mut self) -> relay_snmp::Result<()> {
        self.journal.lock().unwrap().closed.push(self.address.clone());
        Ok(())
    }
}

struct FixedClock;

impl TrapClock for FixedClock {
    fn uptime_ticks(&self) -> u32 {
        4200
    }

    fn engine_time(&self) -> EngineTime {
        EngineTime { boots: 0, time: 42 }
    }
}

fn parser() -> AlertParser {
    AlertParser::new(ParserConfig {
        oid_resolution: OidResolution::from_options("oid", "1.3.6.1.4.1.98789.1", None, None),
        severity_label: "severity".to_string(),
        default_severity: "critical".to_string(),
        severities: SeverityRanking::new(vec![
            "critical".to_string(),
            "warning".to_string(),
            "info".to_string(),
        ])
        .unwrap(),
    })
    .unwrap()
}

fn builder(description: &str) -> TrapBuilder {
    let mut templates = TemplateService::new();
    templates.add_template("description", description).unwrap();
    TrapBuilder::new(
        TrapBuilderConfig {
            layout: ObjectsLayout::Bases {
                default_objects: "1.3.6.1.4.1.98789.2".parse().unwrap(),
                user_objects: "1.3.6.1.4.1.98789.3".parse().unwrap(),
            },
            description_template: "description".to_string(),
            user_objects: vec![],
        },
        Arc::new(templates),
    )
    .unwrap()
}

fn two_trap_batch() -> AlertBatch {
    AlertBatch::new(vec![
        Alert::firing().with_label("oid", "1.3.6.1.4.1.98789.1.10"),
        Alert::firing()
            .with_label("oid", "1.3.6.1.4.1.98789.1.20")
            .with_label("severity", "warning"),
    ])
}

fn sender(
    transport: Arc<dyn TrapTransport>,
    destinations: Vec<DestinationProfile>,
    telemetry: Arc<dyn TelemetrySink>,
    description: &str,
) -> TrapSender {
    TrapSender::new(
        builder(description),
        transport,
        destinations,
        telemetry,
        Arc::new(FixedClock),
    )
}

#[tokio::test]
async fn test_one_unreachable_destination() {
    let journal = Arc::new(Mutex::new(Journal::default()));
    let transport = Arc::new(MockTransport {
        unreachable: ["10.0.0.2:162".to_string()].into_iter().collect(),
        failing: HashSet::new(),
        journal: journal.clone(),
    });
    let telemetry = Arc::new(MetricsCollector::new().unwrap());
    let sender = sender(
        transport,
        vec![
            DestinationProfile::v2c("10.0.0.1:162", "public"),
            DestinationProfile::v2c("10.0.0.2:162", "public"),
        ],
        telemetry.clone(),
        DEFAULT_DESCRIPTION_TEMPLATE,
    );

    let bucket = parser().parse(&two_trap_batch()).unwrap();
    let result = sender.send_alert_traps(&bucket).await;

    match result {
        Err(RelayError::Transport { failed }) => assert_eq!(failed, vec!["10.0.0.2:162"]),
        other => panic!("unexpected result: {:?}", other),
    }

    assert_eq!(telemetry.trap_count("10.0.0.1:162", TrapOutcome::Success), 2);
    assert_eq!(telemetry.trap_count("10.0.0.1:162", TrapOutcome::Failure), 0);
    assert_eq!(telemetry.trap_count("10.0.0.2:162", TrapOutcome::Failure), 2);

    let journal = journal.lock().unwrap();
    assert_eq!(journal.sent.len(), 2);
    assert_eq!(journal.closed, vec!["10.0.0.1:162"]);
}

#[tokio::test]
async fn test_traps_sent_in_bucket_order() {
    let journal = Arc::new(Mutex::new(Journal::default()));
    let transport = Arc::new(MockTransport {
        journal: journal.clone(),
        ..Default::default()
    });
    let sender = sender(
        transport,
        vec![DestinationProfile::v2c("10.0.0.1:162", "public")],
        Arc::new(NoopTelemetry),
        "{{ severity }}",
    );

    let bucket = parser().parse(&two_trap_batch()).unwrap();
    assert_ok!(sender.send_alert_traps(&bucket).await);

    let journal = journal.lock().unwrap();
    let trap_ids: Vec<&str> = journal
        .sent
        .iter()
        .map(|(_, pdu)| pdu.var_binds[2].value.as_text().unwrap())
        .collect();
    assert_eq!(
        trap_ids,
        vec!["1.3.6.1.4.1.98789.1.10[]", "1.3.6.1.4.1.98789.1.20[]"]
    );
}

#[tokio::test]
async fn test_send_failures_do_not_stop_remaining_traps() {
    let journal = Arc::new(Mutex::new(Journal::default()));
    let transport = Arc::new(MockTransport {
        failing: ["10.0.0.1:162".to_string()].into_iter().collect(),
        journal: journal.clone(),
        ..Default::default()
    });
    let telemetry = Arc::new(MetricsCollector::new().unwrap());
    let sender = sender(
        transport,
        vec![
            DestinationProfile::v2c("10.0.0.1:162", "public"),
            DestinationProfile::v2c("10.0.0.3:162", "public"),
        ],
        telemetry.clone(),
        "{{ severity }}",
    );

    let bucket = parser().parse(&two_trap_batch()).unwrap();
    let result = sender.send_alert_traps(&bucket).await;

    assert!(matches!(result, Err(RelayError::Transport { ref failed }) if failed == &vec!["10.0.0.1:162".to_string()]));
    assert_eq!(telemetry.trap_count("10.0.0.1:162", TrapOutcome::Failure), 2);
    assert_eq!(telemetry.trap_count("10.0.0.1:162", TrapOutcome::Success), 0);
    assert_eq!(telemetry.trap_count("10.0.0.3:162", TrapOutcome::Success), 2);

    let journal = journal.lock().unwrap();
    assert_eq!(journal.closed.len(), 2);
}

#[tokio::test]
async fn test_render_failure_opens_no_session() {
    let journal = Arc::new(Mutex::new(Journal::default()));
    let transport = Arc::new(MockTransport {
        journal: journal.clone(),
        ..Default::default()
    });
    let telemetry = Arc::new(MetricsCollector::new().unwrap());
    let sender = sender(
        transport,
        vec![DestinationProfile::v2c("10.0.0.1:162", "public")],
        telemetry.clone(),
        "{{ undefined_field.name }}",
    );

    let bucket = parser().parse(&two_trap_batch()).unwrap();
    let result = sender.send_alert_traps(&bucket).await;

    assert!(matches!(result, Err(RelayError::TemplateRender(_))));
    assert!(journal.lock().unwrap().opened.is_empty());
    assert_eq!(telemetry.trap_count("10.0.0.1:162", TrapOutcome::Failure), 0);
}

#[tokio::test]
async fn test_unranked_severity_never_reaches_dispatch() {
    let batch = AlertBatch::new(vec![Alert::firing().with_label("severity", "unknown")]);
    let error = assert_err!(parser().parse(&batch));
    assert!(matches!(error, RelayError::UnrankedSeverity(_)));
}

#[tokio::test]
async fn test_udp_dispatch_with_unreachable_destination() {
    let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let reachable = receiver.local_addr().unwrap().to_string();
    let telemetry = Arc::new(MetricsCollector::new().unwrap());
    let sender = sender(
        Arc::new(UdpTransport::new()),
        vec![
            DestinationProfile::v2c(reachable.clone(), "public"),
            DestinationProfile::v2c("not-an-address", "public")
                .with_retries(0)
                .with_timeout(Duration::from_millis(200)),
        ],
        telemetry.clone(),
        DEFAULT_DESCRIPTION_TEMPLATE,
    );

    let bucket = parser().parse(&two_trap_batch()).unwrap();
    let result = sender.send_alert_traps(&bucket).await;

    assert!(matches!(result, Err(RelayError::Transport { ref failed }) if failed == &vec!["not-an-address".to_string()]));
    assert_eq!(telemetry.trap_count(&reachable, TrapOutcome::Success), 2);
    assert_eq!(telemetry.trap_count("not-an-address", TrapOutcome::Failure), 2);

    let mut buf = vec![0u8; 65535];
    for _ in 0..2 {
        let len = tokio::time::timeout(Duration::from_secs(2), receiver.recv(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(buf[0], 0x30);
        assert!(len > 0);
    }
}

#[test]
fn test_collector_is_a_telemetry_sink() {
    let sink: Arc<dyn TelemetrySink> = Arc::new(MetricsCollector::new().unwrap());
    sink.record_request(200);
}
