//! Pair captions in a short two-page document

use capmatch_api::{process_text, Config, Input};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let document = "Figure 1: Tide gauge locations\n\n\
                    Gauges were placed along the northern shore.\n\n\
                    Table 1: Annual maxima\n\n\
                    Maxima rose by four centimetres per decade.\n\u{000C}\
                    Most gauges cluster near the harbour, see Figure 1.\n";

    // Default configuration
    let output = process_text(document)?;
    for pair in &output.pairs {
        println!(
            "{} {} ({:.2}): {} context, {} references",
            pair.caption.kind,
            pair.caption.number,
            pair.confidence,
            pair.primary_context.len(),
            pair.cross_references.len()
        );
    }
    println!("took {}ms\n", output.metadata.processing_time_ms);

    // Precision preset, figures only
    let processor = Config::builder()
        .precise()
        .include_tables(false)
        .build_processor()?;
    let output = processor.process(Input::from_text(document))?;
    if let Some(pair) = output.pairs.first() {
        println!("{}", pair.combined_text);
    }

    Ok(())
}
