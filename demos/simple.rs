use otb_decode::{
    DecodeConfig, Decoder, Observations, Occupancy, RulesOracle,
    shakmaty::{Chess, Square},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Simulate what a camera would see over the first two moves
    let start = Chess::default();
    let mut frames = vec![start.occupancy()];

    let mut after_e4 = frames[0].clone();
    after_e4[Square::E2] = Occupancy::Empty;
    after_e4[Square::E4] = Occupancy::Light;
    frames.push(after_e4.clone());

    // Black answers ...c5, but the recognizer misreads c5 as light.
    let mut after_c5 = after_e4;
    after_c5[Square::C7] = Occupancy::Empty;
    after_c5[Square::C5] = Occupancy::Light;
    frames.push(after_c5);

    // 2. Decode
    println!("Decoding {} frames...", frames.len());
    let run = Decoder::new(DecodeConfig::default())?.decode(&Observations::Occupancy(frames))?;

    // 3. Output Results
    println!("------------------------------------------------");
    for step in &run.steps {
        println!(
            "{}. {:<6} score {:>4.1}{}",
            step.step,
            step.san,
            step.score.unwrap_or(f64::NAN),
            if step.uncertain { "  (uncertain)" } else { "" }
        );
        for c in &step.candidates {
            println!("      {:<6} {:.1}", c.san, c.score);
        }
    }
    println!("------------------------------------------------");
    println!("Final position: {}", run.final_fen);

    Ok(())
}
