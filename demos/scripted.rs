//! Plays a scripted sequence of synthetic landmark frames through a session and prints what a
//! volunteer would see afterwards.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use srishti::{
    alert::{Location, MemoryAlertStore, VolunteerId},
    body::landmark::{LandmarkIdx as PoseIdx, PoseLandmarks},
    hand::landmark::{Finger, HandLandmarks, LandmarkIdx},
    history::GestureHistory,
    landmark::Landmark,
    session::{LandmarkSource, PresentationSink, Session, SessionOptions, Subscriptions},
};

const FRAME_TIME: Duration = Duration::from_millis(33);

/// Number of frames each scripted hand shape is held for.
const HOLD_FRAMES: usize = 90;

struct ScriptedSource {
    script: Vec<Vec<HandLandmarks>>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl LandmarkSource for ScriptedSource {
    fn start(&mut self, subs: Subscriptions) -> anyhow::Result<()> {
        let script = self.script.clone();
        let stop = self.stop.clone();
        let handle = thread::Builder::new()
            .name("scripted source".into())
            .spawn(move || {
                for hands in script {
                    for _ in 0..HOLD_FRAMES {
                        if stop.load(Ordering::Relaxed) {
                            return;
                        }
                        if subs.pose.send(Some(upright_pose())).is_err()
                            || subs.hands.send(hands.clone()).is_err()
                        {
                            return;
                        }
                        thread::sleep(FRAME_TIME);
                    }
                }
                log::info!("script finished");
            })?;
        self.thread = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            handle.join().ok();
        }
    }
}

struct LogDisplay;

impl PresentationSink for LogDisplay {
    fn show_status(&mut self, status: &str) {
        log::info!("{status}");
    }

    fn show_history(&mut self, history: &GestureHistory) {
        let list = history
            .iter()
            .map(|(g, active)| if active { format!("[{g}]") } else { g.to_string() })
            .collect::<Vec<_>>();
        log::info!("seen: {}", list.join(" "));
    }
}

fn main() -> anyhow::Result<()> {
    srishti::init_logger!();

    let script = vec![
        vec![],
        vec![hand(0.8, 0.8, &[Finger::Thumb])],
        vec![hand(0.5, 0.35, &Finger::FOUR)],
        vec![hand(0.5, 0.8, &[Finger::Index, Finger::Middle])],
        vec![hand(0.3, 0.45, &Finger::FOUR), hand(0.7, 0.45, &Finger::FOUR)],
    ];
    let duration = FRAME_TIME * (script.len() * HOLD_FRAMES) as u32;

    let source = ScriptedSource {
        script,
        stop: Arc::new(AtomicBool::new(false)),
        thread: None,
    };
    let store = MemoryAlertStore::new();
    let here = Location {
        latitude: 12.97,
        longitude: 77.59,
    };
    let mut session = Session::start(
        source,
        LogDisplay,
        store.clone(),
        here,
        SessionOptions::from_env(),
    )?;
    thread::sleep(duration);
    session.stop();

    let volunteer = VolunteerId("volunteer-1".into());
    for (id, alert) in store.open() {
        println!(
            "alert {id}: {} for {} at {:?} ({})",
            alert.gesture, alert.user_id, alert.location, alert.status
        );
        store.assign(id, volunteer.clone())?;
        store.complete(id)?;
    }
    println!("{} alert(s) still open", store.open().len());

    Ok(())
}

fn hand(x: f32, y: f32, up: &[Finger]) -> HandLandmarks {
    let mut lms = [Landmark::default(); HandLandmarks::NUM_LANDMARKS];
    lms[LandmarkIdx::Wrist as usize] = Landmark::new([x, y, 0.0]);

    let thumb: [f32; 4] = if up.contains(&Finger::Thumb) {
        [-0.01, -0.02, -0.06, -0.10]
    } else {
        [-0.01, -0.02, -0.04, -0.03]
    };
    for (i, dy) in thumb.into_iter().enumerate() {
        lms[LandmarkIdx::ThumbCmc as usize + i] = Landmark::new([x - 0.1, y + dy, 0.0]);
    }

    for (i, finger) in Finger::FOUR.into_iter().enumerate() {
        let fx = x + (i as f32 - 1.5) * 0.04;
        let chain: [f32; 4] = if up.contains(&finger) {
            [-0.05, -0.10, -0.13, -0.16]
        } else {
            [-0.05, -0.08, -0.07, -0.06]
        };
        let base = finger.joints().base as usize;
        for (j, dy) in chain.into_iter().enumerate() {
            lms[base + j] = Landmark::new([fx, y + dy, 0.0]);
        }
    }
    HandLandmarks::new(lms)
}

fn upright_pose() -> PoseLandmarks {
    let mut lms = [Landmark::default(); PoseLandmarks::NUM_LANDMARKS];
    for (i, lm) in lms.iter_mut().enumerate() {
        *lm = Landmark::new([0.5, 0.3 + 0.02 * i as f32, 0.0]);
    }
    lms[PoseIdx::RightShoulder as usize] = Landmark::new([0.4, 0.5, 0.0]);
    PoseLandmarks::new(lms)
}
