use lumicube::{EngineHooks, Player, PlayerState, Program};

/// Records every hook emission in order.
#[derive(Default)]
struct HookLog {
    entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Set(String, String),
    Arm(String, String),
    Alpha(f64),
    Param(String, f64),
    Bool(String, bool),
}

impl EngineHooks for HookLog {
    fn set_renderer(&mut self, name: &str, preset: &str) {
        self.entries.push(Entry::Set(name.into(), preset.into()));
    }
    fn arm_next(&mut self, name: &str, preset: &str) {
        self.entries.push(Entry::Arm(name.into(), preset.into()));
    }
    fn set_crossfade(&mut self, alpha: f64) {
        self.entries.push(Entry::Alpha(alpha));
    }
    fn set_param(&mut self, name: &str, value: f64) {
        self.entries.push(Entry::Param(name.into(), value));
    }
    fn set_bool(&mut self, name: &str, value: bool) {
        self.entries.push(Entry::Bool(name.into(), value));
    }
}

fn demo_program() -> Program {
    Program::from_str(
        r#"{
          "version": "seq.v1",
          "loop": true,
          "clips": [
            { "name": "Red", "renderer": "solid", "preset": "Red",
              "durationS": 3.0, "xFadeS": 1.0 },
            { "name": "Grad", "renderer": "grad", "preset": "Rainbow",
              "durationS": 3.0, "xFadeS": 1.0 }
          ]
        }"#,
    )
    .unwrap()
}

#[test]
fn demo_program_hook_sequence() {
    let mut player = Player::new();
    let mut log = HookLog::default();
    player.load(demo_program()).unwrap();
    player.start(&mut log).unwrap();

    // Drive two clip lengths at 10 Hz, with slack for float accumulation
    // around the final boundary.
    for _ in 0..62 {
        player.tick(0.1, &mut log);
    }

    let e = &log.entries;
    // Start primes the first clip.
    assert_eq!(e[0], Entry::Set("solid".into(), "Red".into()));
    assert_eq!(e[1], Entry::Alpha(0.0));

    // Exactly one arm per crossfade window, targeting the gradient clip.
    let arm_positions: Vec<usize> = e
        .iter()
        .enumerate()
        .filter_map(|(i, x)| matches!(x, Entry::Arm(..)).then_some(i))
        .collect();
    assert_eq!(arm_positions.len(), 2, "one arm per boundary: {e:?}");
    assert_eq!(
        e[arm_positions[0]],
        Entry::Arm("grad".into(), "Rainbow".into())
    );
    assert_eq!(
        e[arm_positions[1]],
        Entry::Arm("solid".into(), "Red".into())
    );

    // Alphas between the first arm and the first hard cut climb
    // monotonically from 0 toward 1.
    let cut = e
        .iter()
        .position(|x| *x == Entry::Set("grad".into(), "Rainbow".into()))
        .expect("gradient hard cut");
    assert!(cut > arm_positions[0]);
    let alphas: Vec<f64> = e[arm_positions[0]..cut]
        .iter()
        .filter_map(|x| match x {
            Entry::Alpha(a) => Some(*a),
            _ => None,
        })
        .collect();
    assert!(!alphas.is_empty());
    assert!(alphas.windows(2).all(|w| w[1] > w[0]), "alphas {alphas:?}");
    assert!(*alphas.last().unwrap() <= 1.0);

    // The hard cut is followed by an alpha reset.
    assert_eq!(e[cut + 1], Entry::Alpha(0.0));

    // Looping: the cycle returns to the first clip.
    assert_eq!(player.state(), PlayerState::Running);
    let red_cuts = e
        .iter()
        .filter(|x| **x == Entry::Set("solid".into(), "Red".into()))
        .count();
    assert_eq!(red_cuts, 2, "start + loop wrap");
}

#[test]
fn time_advances_by_dt_and_no_clip_is_skipped() {
    let mut player = Player::new();
    let mut log = HookLog::default();
    let prog = Program::from_str(
        r#"{ "version": "seq.v1",
             "clips": [
               { "name": "A", "renderer": "solid", "durationS": 1.0 },
               { "name": "B", "renderer": "grad", "durationS": 1.0 },
               { "name": "C", "renderer": "calib", "durationS": 1.0 }
             ] }"#,
    )
    .unwrap();
    player.load(prog).unwrap();
    player.start(&mut log).unwrap();

    let mut expected = 0.0;
    for _ in 0..25 {
        player.tick(0.125, &mut log);
        expected += 0.125;
        if player.state() != PlayerState::Running {
            break;
        }
        assert!((player.position() - expected).abs() < 1e-9);
    }

    let cuts: Vec<&Entry> = log
        .entries
        .iter()
        .filter(|x| matches!(x, Entry::Set(..)))
        .collect();
    assert_eq!(
        cuts,
        vec![
            &Entry::Set("solid".into(), "".into()),
            &Entry::Set("grad".into(), "".into()),
            &Entry::Set("calib".into(), "".into()),
        ]
    );
    assert_eq!(player.state(), PlayerState::Idle);
}

#[test]
fn stop_rewinds_and_resets_alpha() {
    let mut player = Player::new();
    let mut log = HookLog::default();
    player.load(demo_program()).unwrap();
    player.start(&mut log).unwrap();
    player.tick(2.5, &mut log);
    player.stop(&mut log);
    assert_eq!(player.state(), PlayerState::Idle);
    assert_eq!(player.position(), 0.0);
    assert_eq!(*log.entries.last().unwrap(), Entry::Alpha(0.0));
}

#[test]
fn load_resets_mid_program_state() {
    let mut player = Player::new();
    let mut log = HookLog::default();
    player.load(demo_program()).unwrap();
    player.start(&mut log).unwrap();
    player.tick(2.5, &mut log);

    player.load(demo_program()).unwrap();
    assert_eq!(player.state(), PlayerState::Idle);
    assert_eq!(player.position(), 0.0);
    assert_eq!(player.clip_index(), 0);
}

#[test]
fn alpha_only_emitted_on_change() {
    let mut player = Player::new();
    let mut log = HookLog::default();
    player.load(demo_program()).unwrap();
    player.start(&mut log).unwrap();

    // Hold inside the fade window without advancing time.
    player.tick(2.5, &mut log);
    let before = log.entries.len();
    player.tick(0.0, &mut log);
    assert_eq!(log.entries.len(), before, "zero dt must be inert");
}
