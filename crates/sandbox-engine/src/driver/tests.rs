use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use anyhow::{Result, anyhow, bail};

use crate::coords::{SurfaceSize, ViewportRect};
use crate::core::{Client, DriverConfig, FrameControl, FrameErrorPolicy, UpdateArgs};
use crate::host::{FrameScheduler, FrameSource, GraphicsContext, Notifier, Surface, TimeSource};

use super::{Bootstrapper, FrameDriver, Launched, StopHandle};

// ── Recording doubles ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Ev {
    Acquire { antialias: bool },
    Blend,
    Resize(SurfaceSize),
    Viewport(ViewportRect),
    Update(f64, f64, f64),
    Render,
    Fatal(String),
    Schedule,
    Cancel,
}

type Log = Rc<RefCell<Vec<Ev>>>;

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

struct FakeHost {
    log: Log,
    live: Rc<Cell<SurfaceSize>>,
    applied: SurfaceSize,
    fail_resize: bool,
    blended: bool,
}

impl Surface for FakeHost {
    fn live_size(&self) -> SurfaceSize {
        self.live.get()
    }

    fn applied_size(&self) -> SurfaceSize {
        self.applied
    }

    fn apply_size(&mut self, size: SurfaceSize) -> Result<()> {
        if self.fail_resize {
            bail!("canvas detached");
        }
        self.applied = size;
        self.log.borrow_mut().push(Ev::Resize(size));
        Ok(())
    }
}

impl GraphicsContext for FakeHost {
    fn set_viewport(&mut self, viewport: ViewportRect) {
        self.log.borrow_mut().push(Ev::Viewport(viewport));
    }

    fn enable_alpha_blending(&mut self) {
        self.blended = true;
        self.log.borrow_mut().push(Ev::Blend);
    }
}

struct FakeClient {
    log: Log,
    fail_update_on: Option<usize>,
    fail_render: bool,
    stop_on_update: Option<StopHandle>,
    updates: usize,
}

impl FakeClient {
    fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            fail_update_on: None,
            fail_render: false,
            stop_on_update: None,
            updates: 0,
        }
    }
}

impl Client for FakeClient {
    fn update(&mut self, elapsed_ms: f64, height: f64, width: f64) -> Result<()> {
        let n = self.updates;
        self.updates += 1;
        self.log.borrow_mut().push(Ev::Update(elapsed_ms, height, width));
        if let Some(handle) = &self.stop_on_update {
            handle.stop();
        }
        if self.fail_update_on == Some(n) {
            return Err(anyhow!("update exploded"));
        }
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        self.log.borrow_mut().push(Ev::Render);
        if self.fail_render {
            bail!("render exploded");
        }
        Ok(())
    }
}

#[derive(Clone)]
struct ManualTime(Rc<Cell<f64>>);

impl TimeSource for ManualTime {
    fn now_ms(&self) -> f64 {
        self.0.get()
    }
}

struct RecordingNotifier(Log);

impl Notifier for RecordingNotifier {
    fn fatal(&self, message: &str) {
        self.0.borrow_mut().push(Ev::Fatal(message.to_string()));
    }
}

/// Callback scheduler that records requests and cancellations.
struct RecordingScheduler {
    log: Log,
    fail_request: bool,
}

impl FrameScheduler for RecordingScheduler {
    fn request_frame(&mut self) -> Result<()> {
        self.log.borrow_mut().push(Ev::Schedule);
        if self.fail_request {
            bail!("refresh signal unavailable");
        }
        Ok(())
    }

    fn cancel_frame(&mut self) {
        self.log.borrow_mut().push(Ev::Cancel);
    }
}

/// Refresh source replaying `(timestamp, viewport)` pairs.
struct Script {
    time: Rc<Cell<f64>>,
    live: Rc<Cell<SurfaceSize>>,
    frames: VecDeque<(f64, SurfaceSize)>,
}

impl FrameSource for Script {
    fn wait_for_frame(&mut self) -> bool {
        match self.frames.pop_front() {
            Some((t, size)) => {
                self.time.set(t);
                self.live.set(size);
                true
            }
            None => false,
        }
    }
}

// ── Fixture ───────────────────────────────────────────────────────────────

const T0: f64 = 10_000.0;

struct Rig {
    log: Log,
    time: Rc<Cell<f64>>,
    live: Rc<Cell<SurfaceSize>>,
    host: FakeHost,
    driver: FrameDriver<FakeClient, ManualTime>,
}

impl Rig {
    /// Bootstraps at `T0` with a surface already matching `size`.
    fn new(config: DriverConfig, size: SurfaceSize) -> Self {
        Self::with_client(config, size, |c| c)
    }

    fn with_client(
        config: DriverConfig,
        size: SurfaceSize,
        tweak: impl FnOnce(FakeClient) -> FakeClient,
    ) -> Self {
        let log = log();
        let time = Rc::new(Cell::new(T0));
        let live = Rc::new(Cell::new(size));

        let host = FakeHost {
            log: log.clone(),
            live: live.clone(),
            applied: size,
            fail_resize: false,
            blended: false,
        };

        let notifier = RecordingNotifier(log.clone());
        let Launched { context, driver } = Bootstrapper::new(config)
            .launch(
                |_| Ok(host),
                |_| Ok(tweak(FakeClient::new(&log))),
                ManualTime(time.clone()),
                &notifier,
            )
            .expect("bootstrap");

        Self {
            log,
            time,
            live,
            host: context,
            driver,
        }
    }

    fn at(&mut self, t: f64, size: SurfaceSize) -> Result<FrameControl> {
        self.time.set(T0 + t);
        self.live.set(size);
        self.driver.frame(&mut self.host)
    }

    fn scheduler(&self) -> RecordingScheduler {
        RecordingScheduler {
            log: self.log.clone(),
            fail_request: false,
        }
    }

    /// One callback-driven refresh at `T0 + t` with the size unchanged.
    fn refresh(&mut self, t: f64, scheduler: &mut RecordingScheduler) -> Result<FrameControl> {
        self.time.set(T0 + t);
        self.driver.scheduled_frame(&mut self.host, scheduler)
    }

    fn take(&self) -> Vec<Ev> {
        std::mem::take(&mut *self.log.borrow_mut())
    }
}

fn sz(w: u32, h: u32) -> SurfaceSize {
    SurfaceSize::new(w, h)
}

// ── Frame order and resize ────────────────────────────────────────────────

#[test]
fn steady_frame_then_resize_frame() {
    let mut rig = Rig::new(DriverConfig::default(), sz(800, 600));
    rig.take();

    assert_eq!(rig.at(16.0, sz(800, 600)).unwrap(), FrameControl::Continue);
    assert_eq!(rig.take(), vec![Ev::Update(16.0, 600.0, 600.0), Ev::Render]);

    assert_eq!(rig.at(32.0, sz(1024, 768)).unwrap(), FrameControl::Continue);
    assert_eq!(
        rig.take(),
        vec![
            Ev::Resize(sz(1024, 768)),
            Ev::Viewport(ViewportRect::new(0, 0, 1024, 768)),
            Ev::Update(32.0, 768.0, 768.0),
            Ev::Render,
        ]
    );
    assert_eq!(rig.host.applied, sz(1024, 768));
}

#[test]
fn unchanged_viewport_never_resizes_again() {
    let mut rig = Rig::new(DriverConfig::default(), sz(300, 150));
    rig.take();

    for i in 1..=5 {
        rig.at(16.0 * i as f64, sz(640, 480)).unwrap();
    }

    let resizes = rig
        .take()
        .into_iter()
        .filter(|e| matches!(e, Ev::Resize(_) | Ev::Viewport(_)))
        .collect::<Vec<_>>();
    assert_eq!(
        resizes,
        vec![
            Ev::Resize(sz(640, 480)),
            Ev::Viewport(ViewportRect::new(0, 0, 640, 480)),
        ]
    );
}

#[test]
fn width_only_change_triggers_resize() {
    let mut rig = Rig::new(DriverConfig::default(), sz(800, 600));
    rig.take();

    let report = rig.driver.step(&mut rig.host).unwrap().unwrap();
    assert!(!report.resized);

    rig.live.set(sz(801, 600));
    let report = rig.driver.step(&mut rig.host).unwrap().unwrap();
    assert!(report.resized);
    assert_eq!(report.size, sz(801, 600));
}

#[test]
fn update_and_render_once_each_in_order() {
    let mut rig = Rig::new(DriverConfig::default(), sz(800, 600));
    rig.take();

    for i in 1..=4 {
        rig.at(i as f64, sz(800, 600)).unwrap();
        let frame = rig.take();
        assert_eq!(frame.len(), 2);
        assert!(matches!(frame[0], Ev::Update(..)));
        assert_eq!(frame[1], Ev::Render);
    }
}

#[test]
fn corrected_update_args_pass_width() {
    let cfg = DriverConfig::default().update_args(UpdateArgs::HeightWidth);
    let mut rig = Rig::new(cfg, sz(800, 600));
    rig.take();

    rig.at(16.0, sz(800, 600)).unwrap();
    assert_eq!(rig.take()[0], Ev::Update(16.0, 600.0, 800.0));
}

// ── Time ──────────────────────────────────────────────────────────────────

#[test]
fn elapsed_is_frame_time_minus_epoch_and_non_decreasing() {
    let log = log();
    let time = Rc::new(Cell::new(T0));
    let live = Rc::new(Cell::new(sz(800, 600)));
    let mut host = FakeHost {
        log: log.clone(),
        live: live.clone(),
        applied: sz(800, 600),
        fail_resize: false,
        blended: false,
    };

    let Launched { mut driver, .. } = Bootstrapper::default()
        .launch(
            |_| Ok(FakeHost {
                log: log.clone(),
                live: live.clone(),
                applied: sz(800, 600),
                fail_resize: false,
                blended: false,
            }),
            |_| Ok(FakeClient::new(&log)),
            ManualTime(time.clone()),
            &RecordingNotifier(log.clone()),
        )
        .unwrap();

    let stamps = [T0 + 16.0, T0 + 33.0, T0 + 33.0, T0 + 50.5, T0 + 1_000.0];
    let mut script = Script {
        time: time.clone(),
        live: live.clone(),
        frames: stamps.iter().map(|t| (*t, sz(800, 600))).collect(),
    };

    assert_eq!(driver.run(&mut host, &mut script).unwrap(), stamps.len() as u64);

    let elapsed: Vec<f64> = log
        .borrow()
        .iter()
        .filter_map(|e| match e {
            Ev::Update(t, _, _) => Some(*t),
            _ => None,
        })
        .collect();

    let expected: Vec<f64> = stamps.iter().map(|t| t - T0).collect();
    assert_eq!(elapsed, expected);
    assert!(elapsed.windows(2).all(|w| w[0] <= w[1]));
}

// ── Bootstrap ─────────────────────────────────────────────────────────────

#[test]
fn missing_context_notifies_once_and_never_runs_the_client() {
    let log = log();
    let notifier = RecordingNotifier(log.clone());
    let constructed = Cell::new(false);

    let result = Bootstrapper::new(DriverConfig::default().alpha_blending(true)).launch(
        |opts| -> Result<FakeHost> {
            log.borrow_mut().push(Ev::Acquire {
                antialias: opts.antialias,
            });
            bail!("webgl unsupported")
        },
        |_| {
            constructed.set(true);
            Ok(FakeClient::new(&log))
        },
        ManualTime(Rc::new(Cell::new(0.0))),
        &notifier,
    );

    let err = result.err().expect("launch must fail");
    assert!(format!("{err:#}").contains("webgl unsupported"));
    assert!(!constructed.get());
    assert_eq!(
        *log.borrow(),
        vec![
            Ev::Acquire { antialias: true },
            Ev::Fatal("Failed to initialize webgl".to_string()),
        ]
    );
}

#[test]
fn context_options_are_forwarded() {
    let log = log();
    let cfg = DriverConfig::default().antialias(false);
    let _ = Bootstrapper::new(cfg).launch(
        |opts| -> Result<FakeHost> {
            log.borrow_mut().push(Ev::Acquire {
                antialias: opts.antialias,
            });
            bail!("no context")
        },
        |_| Ok(FakeClient::new(&log)),
        ManualTime(Rc::new(Cell::new(0.0))),
        &RecordingNotifier(log.clone()),
    );
    assert_eq!(log.borrow()[0], Ev::Acquire { antialias: false });
}

#[test]
fn blending_variant_configures_once_before_first_frame() {
    let mut rig = Rig::new(DriverConfig::default().alpha_blending(true), sz(800, 600));
    assert_eq!(rig.take(), vec![Ev::Blend]);

    for i in 1..=3 {
        rig.at(16.0 * i as f64, sz(1024 + i, 768)).unwrap();
    }
    assert!(!rig.take().contains(&Ev::Blend));
}

#[test]
fn plain_variant_never_configures_blending() {
    let mut rig = Rig::new(DriverConfig::default(), sz(800, 600));
    rig.at(16.0, sz(800, 600)).unwrap();
    assert!(!rig.take().contains(&Ev::Blend));
}

#[test]
fn client_construction_failure_is_an_error_without_notification() {
    let log = log();
    let result = Bootstrapper::default().launch(
        |_| {
            Ok(FakeHost {
                log: log.clone(),
                live: Rc::new(Cell::new(sz(1, 1))),
                applied: sz(1, 1),
                fail_resize: false,
                blended: false,
            })
        },
        |_| -> Result<FakeClient> { bail!("module failed to load") },
        ManualTime(Rc::new(Cell::new(0.0))),
        &RecordingNotifier(log.clone()),
    );

    assert!(result.is_err());
    assert!(log.borrow().iter().all(|e| !matches!(e, Ev::Fatal(_))));
}

// ── Stop and failure policy ───────────────────────────────────────────────

#[test]
fn stopped_driver_does_not_touch_the_client() {
    let mut rig = Rig::new(DriverConfig::default(), sz(800, 600));
    rig.take();

    let handle = rig.driver.stop_handle();
    handle.stop();

    assert_eq!(rig.at(16.0, sz(1024, 768)).unwrap(), FrameControl::Stop);
    assert!(rig.driver.step(&mut rig.host).unwrap().is_none());
    assert!(rig.take().is_empty());
    assert!(!rig.driver.is_running());
}

#[test]
fn run_ends_when_stopped_mid_stream() {
    let mut rig = Rig::new(DriverConfig::default(), sz(800, 600));
    let handle = rig.driver.stop_handle();

    struct StopAfter {
        left: u32,
        handle: super::StopHandle,
    }

    impl FrameSource for StopAfter {
        fn wait_for_frame(&mut self) -> bool {
            if self.left == 0 {
                self.handle.stop();
            } else {
                self.left -= 1;
            }
            true
        }
    }

    let mut src = StopAfter { left: 3, handle };
    assert_eq!(rig.driver.run(&mut rig.host, &mut src).unwrap(), 3);
}

#[test]
fn continue_policy_keeps_the_loop_alive_after_a_failed_frame() {
    let mut rig = Rig::with_client(DriverConfig::default(), sz(800, 600), |mut c| {
        c.fail_update_on = Some(0);
        c
    });
    rig.take();

    assert_eq!(rig.at(16.0, sz(800, 600)).unwrap(), FrameControl::Continue);
    // A failed update skips the render of that frame.
    assert_eq!(rig.take(), vec![Ev::Update(16.0, 600.0, 600.0)]);

    assert_eq!(rig.at(32.0, sz(800, 600)).unwrap(), FrameControl::Continue);
    assert_eq!(rig.take(), vec![Ev::Update(32.0, 600.0, 600.0), Ev::Render]);
    assert!(rig.driver.is_running());
}

#[test]
fn halt_policy_stops_and_reports_the_error() {
    let cfg = DriverConfig::default().on_frame_error(FrameErrorPolicy::Halt);
    let mut rig = Rig::with_client(cfg, sz(800, 600), |mut c| {
        c.fail_render = true;
        c
    });

    let err = rig.at(16.0, sz(800, 600)).unwrap_err();
    assert!(format!("{err:#}").contains("render exploded"));
    assert!(!rig.driver.is_running());

    rig.take();
    assert_eq!(rig.at(32.0, sz(800, 600)).unwrap(), FrameControl::Stop);
    assert!(rig.take().is_empty());
}

#[test]
fn halt_policy_surfaces_from_run() {
    let cfg = DriverConfig::default().on_frame_error(FrameErrorPolicy::Halt);
    let mut rig = Rig::with_client(cfg, sz(800, 600), |mut c| {
        c.fail_update_on = Some(1);
        c
    });

    let mut script = Script {
        time: rig.time.clone(),
        live: rig.live.clone(),
        frames: (1..=5).map(|i| (T0 + 16.0 * i as f64, sz(800, 600))).collect(),
    };

    assert!(rig.driver.run(&mut rig.host, &mut script).is_err());
    assert_eq!(rig.driver.frames(), 2);
    assert_eq!(script.frames.len(), 3);
}

#[test]
fn failed_resize_skips_the_client() {
    let mut rig = Rig::new(DriverConfig::default(), sz(800, 600));
    rig.take();
    rig.host.fail_resize = true;

    rig.live.set(sz(1024, 768));
    let err = rig.driver.step(&mut rig.host).unwrap_err();
    assert!(format!("{err:#}").contains("1024x768"));
    assert!(rig.take().is_empty());
}

// ── Callback scheduling ───────────────────────────────────────────────────

#[test]
fn next_refresh_is_requested_before_the_frame_runs() {
    let mut rig = Rig::new(DriverConfig::default(), sz(800, 600));
    let mut sched = rig.scheduler();
    rig.take();

    assert_eq!(rig.refresh(16.0, &mut sched).unwrap(), FrameControl::Continue);
    assert_eq!(
        rig.take(),
        vec![Ev::Schedule, Ev::Update(16.0, 600.0, 600.0), Ev::Render]
    );
}

#[test]
fn failed_frame_stays_scheduled_under_continue() {
    let mut rig = Rig::with_client(DriverConfig::default(), sz(800, 600), |mut c| {
        c.fail_update_on = Some(0);
        c
    });
    let mut sched = rig.scheduler();
    rig.take();

    assert_eq!(rig.refresh(16.0, &mut sched).unwrap(), FrameControl::Continue);
    assert_eq!(rig.take(), vec![Ev::Schedule, Ev::Update(16.0, 600.0, 600.0)]);

    assert_eq!(rig.refresh(32.0, &mut sched).unwrap(), FrameControl::Continue);
    assert_eq!(
        rig.take(),
        vec![Ev::Schedule, Ev::Update(32.0, 600.0, 600.0), Ev::Render]
    );
}

#[test]
fn halted_frame_cancels_the_pending_refresh() {
    let cfg = DriverConfig::default().on_frame_error(FrameErrorPolicy::Halt);
    let mut rig = Rig::with_client(cfg, sz(800, 600), |mut c| {
        c.fail_render = true;
        c
    });
    let mut sched = rig.scheduler();
    rig.take();

    let err = rig.refresh(16.0, &mut sched).unwrap_err();
    assert!(format!("{err:#}").contains("render exploded"));
    assert_eq!(
        rig.take(),
        vec![Ev::Schedule, Ev::Update(16.0, 600.0, 600.0), Ev::Render, Ev::Cancel]
    );
    assert!(!rig.driver.is_running());
}

#[test]
fn stop_requested_during_a_frame_cancels_after_it() {
    let mut rig = Rig::new(DriverConfig::default(), sz(800, 600));
    let handle = rig.driver.stop_handle();
    rig.driver.client_mut().stop_on_update = Some(handle);
    let mut sched = rig.scheduler();
    rig.take();

    assert_eq!(rig.refresh(16.0, &mut sched).unwrap(), FrameControl::Stop);
    assert_eq!(
        rig.take(),
        vec![Ev::Schedule, Ev::Update(16.0, 600.0, 600.0), Ev::Render, Ev::Cancel]
    );
}

#[test]
fn stopped_driver_only_cancels() {
    let mut rig = Rig::new(DriverConfig::default(), sz(800, 600));
    let mut sched = rig.scheduler();
    rig.driver.stop_handle().stop();
    rig.take();

    assert_eq!(rig.refresh(16.0, &mut sched).unwrap(), FrameControl::Stop);
    assert_eq!(rig.take(), vec![Ev::Cancel]);
}

#[test]
fn scheduling_failure_does_not_skip_the_current_frame() {
    let mut rig = Rig::new(DriverConfig::default(), sz(800, 600));
    let mut sched = RecordingScheduler {
        log: rig.log.clone(),
        fail_request: true,
    };
    rig.take();

    assert_eq!(rig.refresh(16.0, &mut sched).unwrap(), FrameControl::Continue);
    assert_eq!(
        rig.take(),
        vec![Ev::Schedule, Ev::Update(16.0, 600.0, 600.0), Ev::Render]
    );
}

#[test]
fn client_factory_receives_the_configured_context() {
    let log = log();
    let seen = Cell::new(None);

    let launched = Bootstrapper::new(DriverConfig::default().alpha_blending(true)).launch(
        |_| {
            Ok(FakeHost {
                log: log.clone(),
                live: Rc::new(Cell::new(sz(800, 600))),
                applied: sz(800, 600),
                fail_resize: false,
                blended: false,
            })
        },
        |ctx: &FakeHost| {
            seen.set(Some((ctx.blended, ctx.applied)));
            Ok(FakeClient::new(&log))
        },
        ManualTime(Rc::new(Cell::new(0.0))),
        &RecordingNotifier(log.clone()),
    );

    assert!(launched.is_ok());
    assert_eq!(seen.get(), Some((true, sz(800, 600))));
}
