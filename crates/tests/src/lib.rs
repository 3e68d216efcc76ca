//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 回环 UDP 端到端测试 (emitter -> source -> queue -> dispatch loop -> sinks)
//! - 总线参数端到端测试 (bus -> registry -> dispatch loop -> sinks)

#[cfg(test)]
mod contract_tests {
    use contracts::{Instrument, ParameterKind};

    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_parameter_vocabulary_snapshot() {
        let names: Vec<&str> = ParameterKind::ALL.iter().map(|k| k.name()).collect();
        assert!(names.contains(&"Roll Angle"));
        assert!(names.contains(&"Pitch Angle"));
        assert!(names.contains(&"Heading"));
        for kind in ParameterKind::ALL {
            assert_eq!(ParameterKind::from_name(kind.name()), Some(kind));
        }
        // Matching is exact
        assert_eq!(ParameterKind::from_name("roll angle"), None);
        assert_eq!(ParameterKind::from_name("Heading "), None);
    }

    #[test]
    fn test_instrument_set_snapshot() {
        assert_eq!(Instrument::ALL.len(), 13);
        assert_eq!(contracts::TelemetryFrame::UPDATE_COUNT, 11);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::{Duration, Instant};

    use contracts::{Instrument, ParameterKind, ParameterSource};
    use dispatcher::{DispatchLoop, DispatchLoopConfig, InstrumentPanel, ParameterRegistry};
    use ingestion::{
        FrameDecoder, FrameEmitter, NetworkSourceConfig, NetworkTelemetrySource, QueuePolicy,
        SimulatedBus, TelemetryQueue,
    };
    use tokio::sync::oneshot;

    const SAMPLE: &str = "120.5,3.2,-1.1,270.0,4500,0,0,2100.0,380.5,210.0,1250.0,7.5,15.2,10.0";

    fn loopback_source(queue: &TelemetryQueue) -> NetworkTelemetrySource {
        let config = NetworkSourceConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            read_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        NetworkTelemetrySource::new("fgfs", config, queue.clone())
    }

    async fn wait_until(mut done: impl FnMut() -> bool, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !done() {
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        true
    }

    /// End-to-end test: FrameEmitter -> NetworkTelemetrySource -> DispatchLoop -> GaugeSinks
    ///
    /// 验证完整的数据流：
    /// 1. 模拟器发送 14 字段数据帧
    /// 2. 接收线程入队
    /// 3. 分发循环解码并更新全部仪表
    #[tokio::test]
    async fn test_e2e_network_pipeline() {
        let queue = TelemetryQueue::unbounded();
        let source = loopback_source(&queue);
        let addr = source.start().unwrap();

        let (panel, board) = InstrumentPanel::with_gauges(true);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let dispatch = DispatchLoop::new(DispatchLoopConfig::default(), panel)
            .with_queue(queue.clone(), FrameDecoder::default())
            .spawn(async move {
                let _ = stop_rx.await;
            });

        let mut emitter = FrameEmitter::connect(addr).unwrap();
        emitter.send_text(SAMPLE).unwrap();

        assert!(wait_until(|| board.updates(Instrument::Airspeed) == 1, Duration::from_secs(2)).await);
        assert_eq!(board.value(Instrument::Airspeed), Some(120.5));
        assert_eq!(board.value(Instrument::PitchAngle), Some(3.2));
        assert_eq!(board.value(Instrument::RollAngle), Some(-1.1));
        assert_eq!(board.value(Instrument::Heading), Some(270.0));
        assert_eq!(board.value(Instrument::Altitude), Some(4500.0));
        assert_eq!(board.value(Instrument::Rpm), Some(2100.0));
        assert_eq!(board.value(Instrument::OilTemperature), Some(380.5));
        assert_eq!(board.value(Instrument::OilPressure), Some(210.0));
        assert_eq!(board.value(Instrument::Egt), Some(1250.0));
        assert_eq!(board.value(Instrument::FuelFlow), Some(7.5));
        let fuel = board.value(Instrument::FuelQuantity).unwrap();
        assert!((fuel - 25.2).abs() < 1e-9);

        // Shutdown: producer first, then the loop
        source.stop();
        assert!(source.join(Duration::from_secs(1)));
        stop_tx.send(()).unwrap();
        let stats = dispatch.await.unwrap();

        assert_eq!(stats.counters.frames_applied, 1);
        assert_eq!(stats.counters.frames_dropped, 0);
        assert_eq!(source.metrics().snapshot().frames_received, 1);
    }

    /// 畸形帧被丢弃，不影响之前的仪表值
    #[tokio::test]
    async fn test_e2e_malformed_frames_are_dropped() {
        let queue = TelemetryQueue::unbounded();
        let source = loopback_source(&queue);
        let addr = source.start().unwrap();

        let (panel, board) = InstrumentPanel::with_gauges(false);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let dispatch = DispatchLoop::new(DispatchLoopConfig::default(), panel)
            .with_queue(queue.clone(), FrameDecoder::default())
            .spawn(async move {
                let _ = stop_rx.await;
            });

        let mut emitter = FrameEmitter::connect(addr).unwrap();
        emitter.send_text(SAMPLE).unwrap();
        emitter
            .send_text("99.0,3.2,-1.1,270.0,4500,0,0,2100.0,380.5,210.0,1250.0,7.5,15.2")
            .unwrap();
        emitter
            .send_text("99.0,3.2,abc,270.0,4500,0,0,2100.0,380.5,210.0,1250.0,7.5,15.2,10.0")
            .unwrap();
        emitter.send_text("").unwrap();

        let metrics = source.metrics();
        assert!(wait_until(|| metrics.snapshot().frames_received == 4, Duration::from_secs(2)).await);
        source.stop();
        source.join(Duration::from_secs(1));
        stop_tx.send(()).unwrap();
        let stats = dispatch.await.unwrap();

        assert_eq!(stats.counters.frames_applied, 1);
        assert_eq!(stats.counters.frames_dropped, 3);
        assert_eq!(board.value(Instrument::Airspeed), Some(120.5));
        assert_eq!(board.updates(Instrument::Airspeed), 1);
    }

    /// 生产者持续推送时，消费者不丢帧、不重复、保持顺序
    #[tokio::test]
    async fn test_e2e_burst_is_consumed_in_order() {
        let queue = TelemetryQueue::unbounded();
        let source = loopback_source(&queue);
        let addr = source.start().unwrap();

        let (panel, board) = InstrumentPanel::with_gauges(false);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let dispatch = DispatchLoop::new(DispatchLoopConfig::default(), panel)
            .with_queue(queue.clone(), FrameDecoder::default())
            .spawn(async move {
                let _ = stop_rx.await;
            });

        let total = 200u64;
        let mut emitter = FrameEmitter::connect(addr).unwrap();
        for i in 0..total {
            let text = SAMPLE.replacen("120.5", &i.to_string(), 1);
            emitter.send_text(&text).unwrap();
        }

        let metrics = source.metrics();
        assert!(wait_until(|| metrics.snapshot().frames_received == total, Duration::from_secs(3)).await);
        source.stop();
        source.join(Duration::from_secs(1));
        stop_tx.send(()).unwrap();
        let stats = dispatch.await.unwrap();

        assert_eq!(stats.counters.frames_applied, total);
        assert_eq!(board.updates(Instrument::Airspeed), total);
        assert_eq!(board.value(Instrument::Airspeed), Some((total - 1) as f64));
        assert!(queue.is_empty());
    }

    /// End-to-end test: SimulatedBus -> RegistryHandle -> DispatchLoop -> GaugeSinks
    #[tokio::test]
    async fn test_e2e_bus_sweep() {
        let (panel, board) = InstrumentPanel::with_gauges(false);
        let registry = ParameterRegistry::with_bindings(contracts::default_bindings(contracts::Mode::Test));
        let dispatch = DispatchLoop::new(DispatchLoopConfig::default(), panel).with_registry(registry);

        let bus = SimulatedBus::sweep("sweep", 200.0, 2.0);
        bus.set_parameter_callback(dispatch.registry_handle().callback());

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let handle = dispatch.spawn(async move {
            let _ = stop_rx.await;
        });
        bus.start().unwrap();

        assert!(wait_until(|| board.updates(Instrument::MaxCht) >= 10, Duration::from_secs(3)).await);
        bus.stop();
        stop_tx.send(()).unwrap();
        let stats = handle.await.unwrap();

        // Every panel instrument is wired in test mode
        for instrument in Instrument::ALL {
            assert!(board.updates(instrument) > 0, "{instrument} never updated");
        }
        let roll = board.value(Instrument::RollAngle).unwrap();
        assert!((-180.0..=180.0).contains(&roll));
        let rpm = board.value(Instrument::Rpm).unwrap();
        assert!((0.0..=3000.0).contains(&rpm));

        assert_eq!(stats.counters.frames_applied, 0);
        assert_eq!(stats.counters.parameters_unbound, 0);
        assert_eq!(stats.parameters_unknown, 0);
        assert!(stats.counters.parameters_applied >= 12 * 10);
    }

    /// 总线与网络同时工作时，两条路径都只在分发循环上更新仪表
    #[tokio::test]
    async fn test_e2e_bus_and_network_share_the_loop() {
        let queue = TelemetryQueue::unbounded();
        let source = loopback_source(&queue);
        let addr = source.start().unwrap();

        let (panel, board) = InstrumentPanel::with_gauges(false);
        let registry = ParameterRegistry::with_bindings([(ParameterKind::ManifoldPressure, Instrument::ManifoldPressure)]);
        let dispatch = DispatchLoop::new(DispatchLoopConfig::default(), panel)
            .with_queue(queue.clone(), FrameDecoder::default())
            .with_registry(registry);
        let handle = dispatch.registry_handle();

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let task = dispatch.spawn(async move {
            let _ = stop_rx.await;
        });

        let producer = std::thread::spawn(move || {
            for i in 0..20 {
                handle.dispatch("Manifold Pressure", 20.0 + i as f64 * 0.1);
            }
        });
        let mut emitter = FrameEmitter::connect(addr).unwrap();
        emitter.send_text(SAMPLE).unwrap();
        producer.join().unwrap();

        assert!(wait_until(|| board.updates(Instrument::Heading) == 1, Duration::from_secs(2)).await);
        source.stop();
        source.join(Duration::from_secs(1));
        stop_tx.send(()).unwrap();
        let stats = task.await.unwrap();

        assert_eq!(board.updates(Instrument::ManifoldPressure), 20);
        let map = board.value(Instrument::ManifoldPressure).unwrap();
        assert!((map - 21.9).abs() < 1e-9);
        assert_eq!(stats.counters.parameters_applied, 20);
        assert_eq!(stats.counters.frames_applied, 1);
    }

    /// 配置驱动：自定义字段布局 + drop_oldest 队列
    #[tokio::test]
    async fn test_e2e_from_config() {
        let content = r#"
mode = "fgfs"

[network]
port = 0
read_timeout_ms = 20

[queue]
policy = "drop_oldest"
capacity = 8

[layout]
airspeed = 13
fuel_tanks = [0]
"#;
        let blueprint =
            config_loader::ConfigLoader::load_from_str(content, config_loader::ConfigFormat::Toml)
                .unwrap();
        assert_eq!(blueprint.queue.to_policy(), QueuePolicy::DropOldest { capacity: 8 });

        let queue = TelemetryQueue::new(blueprint.queue.to_policy());
        let source = NetworkTelemetrySource::new(
            "fgfs",
            NetworkSourceConfig::from(&blueprint.network),
            queue.clone(),
        );
        let addr = source.start().unwrap();

        let (panel, board) = InstrumentPanel::with_gauges(false);
        let loop_config = DispatchLoopConfig::from_config(&blueprint.dispatch).unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let task = DispatchLoop::new(loop_config, panel)
            .with_queue(queue.clone(), FrameDecoder::new(blueprint.layout.clone()))
            .spawn(async move {
                let _ = stop_rx.await;
            });

        let mut emitter = FrameEmitter::connect(addr).unwrap();
        emitter.send_text(SAMPLE).unwrap();

        assert!(wait_until(|| board.updates(Instrument::Airspeed) == 1, Duration::from_secs(2)).await);
        source.stop();
        source.join(Duration::from_secs(1));
        stop_tx.send(()).unwrap();
        task.await.unwrap();

        // Field 13 now feeds airspeed, field 0 the single fuel tank
        assert_eq!(board.value(Instrument::Airspeed), Some(10.0));
        assert_eq!(board.value(Instrument::FuelQuantity), Some(120.5));
    }
}
