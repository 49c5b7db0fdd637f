use assert_approx_eq::assert_approx_eq;
use otb_decode::{
    DecodeConfig, DecodeError, DecodeMode, Decoder, IdGrid, Observations, Occupancy,
    OccupancyGrid, RulesOracle, decode, infer_mapping, position_from_fen,
    shakmaty::{Chess, Square},
    tags,
};

fn play(pos: &mut Chess, uci: &str) {
    let m = pos
        .enumerate_moves()
        .into_iter()
        .find(|m| pos.uci(m) == uci)
        .unwrap_or_else(|| panic!("{uci} is not legal in {}", pos.to_fen()));
    pos.commit(&m);
}

/// Clean occupancy frames for a line of play from the standard start.
fn occupancy_frames(line: &[&str]) -> Vec<OccupancyGrid> {
    let mut pos = Chess::default();
    let mut frames = vec![pos.occupancy()];
    for uci in line {
        play(&mut pos, uci);
        frames.push(pos.occupancy());
    }
    frames
}

/// Give every occupied square its own tag, numbered from 1 in square order.
fn tag_everything<P: RulesOracle>(pos: &P) -> IdGrid {
    let mut grid = IdGrid::empty();
    let mut next = 1;
    for sq in Square::ALL {
        if pos.piece_on(sq).is_some() {
            grid[sq] = next;
            next += 1;
        }
    }
    grid
}

/// A short game with a few recognition errors sprinkled in.
fn noisy_frames() -> Vec<OccupancyGrid> {
    let mut frames = occupancy_frames(&["e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "a7a6", "b5c6"]);
    frames[2][Square::E5] = Occupancy::Light;
    frames[3][Square::H7] = Occupancy::Empty;
    frames[5][Square::C6] = Occupancy::Light;
    frames[6][Square::A6] = Occupancy::Empty;
    frames[7][Square::D7] = Occupancy::Empty;
    frames
}

#[test]
fn trivial_opening_is_confident() {
    let pos = Chess::default();
    let start = pos.occupancy();
    let mut after = start.clone();
    after[Square::E2] = Occupancy::Empty;
    after[Square::E4] = Occupancy::Light;

    let run = decode(&Observations::Occupancy(vec![start, after]), DecodeConfig::default()).unwrap();
    assert_eq!(run.mode, DecodeMode::Occupancy);
    assert_eq!(run.steps.len(), 1);
    let step = &run.steps[0];
    assert_eq!(step.san, "e4");
    assert_eq!(step.uci.as_deref(), Some("e2e4"));
    assert_approx_eq!(step.score.unwrap(), 0.0);
    assert!(!step.uncertain);
    assert!(run.uncertain.is_empty());
}

#[test]
fn tag_carried_to_destination_ranks_first() {
    let pos = Chess::default();
    let mut prev = IdGrid::empty();
    prev[Square::E2] = 5;
    let mut curr = IdGrid::empty();
    curr[Square::E4] = 5;
    let id_map = infer_mapping(&prev, &pos);

    let ranked = tags::score_moves(&pos, &prev, &curr, &id_map);
    assert_eq!(pos.uci(&ranked[0].mv), "e2e4");
    assert_approx_eq!(ranked[0].score, 110.0);
    for other in &ranked[1..] {
        assert!(other.score < ranked[0].score, "{}", pos.uci(&other.mv));
    }
}

#[test]
fn ambiguous_capture_is_flagged() {
    let fen = "4k3/8/8/3p4/2P1P3/8/8/4K3 w - - 0 1";
    let pos = position_from_fen(Some(fen)).unwrap();
    let before = pos.occupancy();
    // A white piece now stands on d5, but neither pawn was seen leaving.
    let mut after = before.clone();
    after[Square::D5] = Occupancy::Light;

    let config = DecodeConfig {
        initial_fen: Some(fen.into()),
        ..DecodeConfig::default()
    };
    let run = decode(&Observations::Occupancy(vec![before, after]), config).unwrap();
    let step = &run.steps[0];
    assert!(step.uncertain);
    assert!(step.san == "cxd5" || step.san == "exd5", "{}", step.san);

    let top: Vec<&str> = step.candidates[..2].iter().map(|c| c.san.as_str()).collect();
    assert!(top.contains(&"cxd5") && top.contains(&"exd5"), "{top:?}");
    assert_approx_eq!(step.candidates[0].score, step.candidates[1].score);

    assert_eq!(run.uncertain.len(), 1);
    let review = &run.uncertain[0];
    assert_eq!(review.step, 1);
    assert_eq!(review.san, step.san);
    assert!(review.candidates.iter().any(|c| c.san == "cxd5"));
    assert!(review.candidates.iter().any(|c| c.san == "exd5"));
}

#[test]
fn occluded_knight_still_resolves() {
    // With h3 taken by a pawn, Nf3 is the knight's only development.
    let fen = "rnbqkbnr/ppppppp1/7p/8/8/7P/PPPPPPP1/RNBQKBNR w KQkq - 0 2";
    let pos = position_from_fen(Some(fen)).unwrap();
    let prev = tag_everything(&pos);
    let knight = prev[Square::G1];
    let id_map = infer_mapping(&prev, &pos);

    // The tag vanished in flight: neither g1 nor f3 shows it.
    let mut occluded = prev.clone();
    occluded[Square::G1] = 0;
    let ranked = tags::score_moves(&pos, &prev, &occluded, &id_map);
    assert_eq!(pos.san(&ranked[0].mv), "Nf3");
    assert!(ranked[1..].iter().all(|c| c.score < ranked[0].score));

    // The same move with the tag seen on f3 carries more evidence.
    let mut carried = occluded.clone();
    carried[Square::F3] = knight;
    let exact = tags::score_moves(&pos, &prev, &carried, &id_map);
    assert_eq!(pos.san(&exact[0].mv), "Nf3");
    assert!(exact[0].score > ranked[0].score);

    let config = DecodeConfig {
        initial_fen: Some(fen.into()),
        ..DecodeConfig::default()
    };
    let run = decode(&Observations::Tags(vec![prev, occluded]), config).unwrap();
    assert_eq!(run.san_moves(), vec!["Nf3"]);
    assert!(!run.steps[0].uncertain);
    assert_eq!(run.id_map.map(|m| m.len()), Some(32));
}

#[test]
fn tag_game_tracks_full_grids() {
    let mut pos = Chess::default();
    let first = tag_everything(&pos);
    let mut frames = vec![first.clone()];
    let mut grid = first;
    for (uci, from, to) in [
        ("e2e4", Square::E2, Square::E4),
        ("d7d5", Square::D7, Square::D5),
        ("e4d5", Square::E4, Square::D5),
    ] {
        play(&mut pos, uci);
        grid[to] = grid[from];
        grid[from] = 0;
        frames.push(grid.clone());
    }

    let run = decode(&Observations::Tags(frames), DecodeConfig::default()).unwrap();
    assert_eq!(run.san_moves(), vec!["e4", "d5", "exd5"]);
    assert_eq!(run.uncertain_count(), 0);
    assert_eq!(run.final_fen, pos.to_fen());
}

#[test]
fn blank_tag_grids_do_not_crash() {
    let frames = vec![IdGrid::empty(); 4];
    let run = decode(&Observations::Tags(frames), DecodeConfig::default()).unwrap();
    assert!(run.id_map.as_ref().is_some_and(|m| m.is_empty()));
    assert_eq!(run.steps.len(), 3);
    for step in &run.steps {
        assert!(step.is_resolved());
        assert!(!step.uncertain);
        // Vacancy bonus and no type evidence, for every candidate alike.
        assert_approx_eq!(step.score.unwrap(), 10.0 - 20.0);
    }
}

#[test]
fn committed_moves_are_legal() {
    let run = decode(&Observations::Occupancy(noisy_frames()), DecodeConfig::default()).unwrap();
    let mut pos = Chess::default();
    for step in &run.steps {
        let uci = step.uci.as_deref().unwrap();
        let legal: Vec<String> = pos.enumerate_moves().iter().map(|m| pos.uci(m)).collect();
        assert!(legal.iter().any(|l| l == uci), "step {}: {uci}", step.step);
        for candidate in &step.candidates {
            assert!(legal.contains(&candidate.uci));
        }
        play(&mut pos, uci);
    }
    assert_eq!(run.final_fen, pos.to_fen());
}

#[test]
fn runs_are_deterministic() {
    let obs = Observations::Occupancy(noisy_frames());
    let first = serde_json::to_string(&decode(&obs, DecodeConfig::default()).unwrap()).unwrap();
    let second = serde_json::to_string(&decode(&obs, DecodeConfig::default()).unwrap()).unwrap();
    assert_eq!(first, second);

    let serial = DecodeConfig {
        parallel: false,
        ..DecodeConfig::default()
    };
    let third = serde_json::to_string(&decode(&obs, serial).unwrap()).unwrap();
    assert_eq!(first, third);
}

#[test]
fn thresholds_are_monotonic() {
    let obs = Observations::Occupancy(noisy_frames());
    let count = |uncertain_threshold: f64, dist_threshold: f64| {
        let config = DecodeConfig {
            uncertain_threshold,
            dist_threshold,
            ..DecodeConfig::default()
        };
        decode(&obs, config).unwrap().uncertain_count()
    };

    let by_dist: Vec<usize> = [0.0, 0.5, 1.0, 2.0, 3.0, 10.0]
        .iter()
        .map(|&d| count(0.1, d))
        .collect();
    assert!(by_dist.windows(2).all(|w| w[0] >= w[1]), "{by_dist:?}");
    assert!(by_dist[0] > by_dist[5], "{by_dist:?}");

    let by_gap: Vec<usize> = [0.0, 0.1, 1.0, 2.0, 5.0]
        .iter()
        .map(|&u| count(u, 2.0))
        .collect();
    assert!(by_gap.windows(2).all(|w| w[0] <= w[1]), "{by_gap:?}");
}

#[test]
fn fewer_than_two_frames_is_insufficient() {
    let one = Observations::Occupancy(vec![Chess::default().occupancy()]);
    assert!(matches!(
        decode(&one, DecodeConfig::default()),
        Err(DecodeError::InsufficientData { frames: 1 })
    ));
    assert!(matches!(
        Observations::from_json("[]"),
        Err(DecodeError::InsufficientData { frames: 0 })
    ));
}

#[test]
fn malformed_frame_aborts_with_index() {
    let good = vec![vec![0; 8]; 8];
    let mut bad = good.clone();
    bad[7][7] = 9;
    let json = serde_json::json!([
        { "occupancy": good },
        { "occupancy": good },
        { "occupancy": bad },
    ])
    .to_string();
    assert!(matches!(
        Observations::from_json(&json),
        Err(DecodeError::MalformedFrame { frame: 2, .. })
    ));
}

#[test]
fn non_integer_cell_aborts_with_index() {
    let good = vec![vec![0; 8]; 8];
    let mut bad = serde_json::json!(good);
    bad[0][3] = serde_json::json!("x");
    let json = serde_json::json!([
        { "occupancy": good },
        { "occupancy": good },
        { "occupancy": bad },
    ])
    .to_string();
    match Observations::from_json(&json) {
        Err(DecodeError::MalformedFrame { frame, .. }) => assert_eq!(frame, 2),
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn json_frames_decode_end_to_end() {
    let frames: Vec<serde_json::Value> = occupancy_frames(&["d2d4", "g8f6"])
        .iter()
        .map(|grid| {
            let rows: Vec<Vec<u8>> = grid
                .cells()
                .rows()
                .into_iter()
                .map(|row| row.iter().map(|c| c.code()).collect())
                .collect();
            serde_json::json!({ "occupancy": rows })
        })
        .collect();
    let obs = Observations::from_json(&serde_json::to_string(&frames).unwrap()).unwrap();
    let run = Decoder::new(DecodeConfig::default()).unwrap().decode(&obs).unwrap();
    assert_eq!(run.san_moves(), vec!["d4", "Nf6"]);

    let value = serde_json::to_value(&run).unwrap();
    assert_eq!(value["mode"], "occupancy");
    assert_eq!(value["steps"][1]["move"], "Nf6");
    assert!(value.get("id_map").is_none());
}
