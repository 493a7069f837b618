use approx::assert_relative_eq;
use nalgebra::Point2;
use swarmtrack_rs::tracker::{Color, Size, angle_difference};
use swarmtrack_rs::{Detection, IdentityTracker, MatchOutcome, Pose, Track, TrackerConfig, Tracked};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn locked_pose(x: f32, y: f32, heading: f32) -> Pose {
    Pose::new(Point2::new(x, y), heading, Size::new(8.0, 3.0), Color::new(200, 40, 40))
        .with_heading(heading, true)
}

fn config(average_speed: f32, target_tracks: usize) -> TrackerConfig {
    TrackerConfig {
        average_speed,
        target_tracks,
        ..Default::default()
    }
}

#[test]
fn test_basic_tracking() {
    init_tracing();
    let track = Track::new(1, 0, locked_pose(0.0, 0.0, 0.0));
    let mut tracker = IdentityTracker::with_tracks(config(10.0, 1), vec![track], 0).unwrap();

    let report = tracker.update(vec![Detection::new(10.0, 0.0, 0.0, 8.0, 3.0)]);
    assert_eq!(report.frame, 1);
    assert_eq!(report.tracks.len(), 1);

    let assignment = &report.tracks[0];
    assert_eq!(assignment.id, 1);
    let pose = assignment.pose().unwrap();
    assert_eq!(pose.position, Point2::new(10.0, 0.0));
    assert_eq!(pose.age, 1);
    assert_relative_eq!(pose.orientation, 0.0, epsilon = 1e-5);
    assert_eq!(pose.color, Color::new(200, 40, 40));
    assert_eq!(tracker.track(1).unwrap().pose_at(1), Some(pose));
}

#[test]
fn test_empty_frame_ages_every_track() {
    init_tracing();
    let tracks = vec![
        Track::new(1, 0, locked_pose(0.0, 0.0, 0.0)),
        Track::new(2, 0, locked_pose(100.0, 0.0, 0.0)),
    ];
    let mut tracker = IdentityTracker::with_tracks(TrackerConfig::default(), tracks, 0).unwrap();

    for frame in 1..=3u32 {
        let report = tracker.update(Vec::new());
        assert!(report.tracks.iter().all(|a| a.outcome == MatchOutcome::Unseen));
        assert!(report.spawned.is_empty());
        for track in tracker.tracks() {
            let pose = track.pose_at(u64::from(frame)).unwrap();
            assert_eq!(pose.age, frame + 1);
        }
    }
    assert!(tracker.candidates().is_empty());
    let mut ids: Vec<u64> = tracker.tracks().iter().map(|t| t.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn test_full_pool_discards_leftovers() {
    init_tracing();
    let tracks = vec![
        Track::new(1, 0, locked_pose(0.0, 0.0, 0.0)),
        Track::new(2, 0, locked_pose(100.0, 0.0, 0.0)),
    ];
    let mut tracker = IdentityTracker::with_tracks(config(5.0, 2), tracks, 0).unwrap();

    let report = tracker.update(vec![
        Detection::new(2.0, 0.0, 0.0, 8.0, 3.0),
        Detection::new(300.0, 300.0, 0.0, 8.0, 3.0),
        Detection::new(101.0, 0.0, 0.0, 8.0, 3.0),
    ]);
    assert_eq!(report.matched_tracks(), 2);
    assert!(report.candidates_cleared);
    assert!(report.spawned.is_empty());
    assert!(tracker.candidates().is_empty());
}

#[test]
fn test_consumed_detections_match_assignments() {
    init_tracing();
    let tracks = vec![
        Track::new(1, 0, locked_pose(0.0, 0.0, 0.0)),
        Track::new(2, 0, locked_pose(50.0, 0.0, 0.0)),
        Track::new(3, 0, locked_pose(100.0, 0.0, 0.0)),
    ];
    let mut tracker = IdentityTracker::with_tracks(config(5.0, 5), tracks, 0).unwrap();

    let detections = vec![
        Detection::new(51.0, 1.0, 10.0, 8.0, 3.0),
        Detection::new(400.0, 0.0, 0.0, 8.0, 3.0),
        Detection::new(1.0, 0.0, 0.0, 8.0, 3.0),
        Detection::new(99.0, -2.0, 0.0, 8.0, 3.0),
        Detection::new(0.0, 400.0, 0.0, 8.0, 3.0),
    ];
    let total = detections.len();
    let report = tracker.update(detections);

    let matched = report.matched_tracks();
    assert_eq!(matched, 3);
    assert!(matched <= total.min(3));
    // the rest opened candidates
    assert_eq!(report.spawned.len(), total - matched);
    assert_eq!(report.spawned, vec![4, 5]);
}

#[test]
fn test_candidate_promotion_flow() {
    init_tracing();
    let config = TrackerConfig {
        promotion_threshold: 3,
        ..Default::default()
    };
    let mut tracker = IdentityTracker::new(config).unwrap();
    let at = |frame: u64| vec![Detection::new(2.0 * (frame - 1) as f32, 0.0, 180.0, 8.0, 3.0)];

    let first = tracker.update(at(1));
    assert_eq!(first.spawned.len(), 1);
    let id = first.spawned[0];
    let color = tracker.candidates()[0].latest_pose().unwrap().color;

    let second = tracker.update(at(2));
    assert!(second.promoted.is_empty());
    assert_eq!(tracker.candidates()[0].score(), 2);

    let third = tracker.update(at(3));
    assert_eq!(third.promoted, vec![id]);
    assert!(tracker.candidates().is_empty());
    assert_eq!(tracker.tracks().len(), 1);
    assert_eq!(tracker.track(id).unwrap().latest_pose().unwrap().color, color);

    // from now on the confirmed track consumes the detection
    for frame in 4..=8 {
        let report = tracker.update(at(frame));
        assert_eq!(report.matched_tracks(), 1);
        assert!(report.spawned.is_empty());
    }

    // the ambiguous 180 degree measurement resolves to the direction of travel
    let pose = tracker.track(id).unwrap().pose_at(8).unwrap();
    assert!(pose.heading_locked);
    assert!(angle_difference(pose.orientation, 0.0).abs() < 1e-3);
    assert_eq!(pose.position, Point2::new(14.0, 0.0));
}

#[test]
fn test_parallel_identities_keep_their_ids() {
    init_tracing();
    let lane = |id: u64, y: f32| {
        let mut track = Track::new(id, 0, locked_pose(0.0, y, 0.0));
        for f in 1..=3u64 {
            track.record(f, locked_pose(3.0 * f as f32, y, 0.0));
        }
        track
    };
    let tracks = vec![lane(1, 0.0), lane(2, 20.0)];
    let mut tracker = IdentityTracker::with_tracks(config(3.0, 2), tracks, 3).unwrap();

    for frame in 4..=20u64 {
        let x = 3.0 * frame as f32;
        let report = tracker.update(vec![
            Detection::new(x, 20.0, 0.0, 8.0, 3.0),
            Detection::new(x, 0.0, 0.0, 8.0, 3.0),
        ]);
        assert_eq!(report.matched_tracks(), 2);
    }

    assert_eq!(tracker.track(1).unwrap().pose_at(20).unwrap().position, Point2::new(60.0, 0.0));
    assert_eq!(tracker.track(2).unwrap().pose_at(20).unwrap().position, Point2::new(60.0, 20.0));
}

#[test]
fn test_reacquired_after_occlusion() {
    init_tracing();
    let track = Track::new(1, 0, locked_pose(0.0, 0.0, 0.0));
    let mut tracker = IdentityTracker::with_tracks(config(5.0, 1), vec![track], 0).unwrap();

    // gone for two frames, then reappears 40 px away: outside the gate of a
    // fresh track (15 px) but inside the widened one (3 * 5 * 3 = 45 px)
    tracker.update(Vec::new());
    tracker.update(Vec::new());
    let report = tracker.update(vec![Detection::new(40.0, 0.0, 0.0, 8.0, 3.0)]);

    assert_eq!(report.matched_tracks(), 1);
    assert_eq!(tracker.track(1).unwrap().pose_at(3).unwrap().age, 1);
}
