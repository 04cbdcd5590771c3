use log::LevelFilter;
use wakeflow::app::{self, ModelParams};
use wakeflow::pipeline;




// ============================================================================
fn init_logging() {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn load_model(args: &[String]) -> anyhow::Result<ModelParams> {
    let (mut model, overrides) = match args.first() {
        Some(path) if path.ends_with(".yaml") || path.ends_with(".yml") => {
            (ModelParams::from_yaml_str(&std::fs::read_to_string(path)?)?, &args[1..])
        }
        _ => (ModelParams::default(), args),
    };
    for key_val in overrides {
        model.patch_from_key_val(key_val)?;
    }
    Ok(model)
}

fn summarize(name: &str, values: &ndarray::Array2<f64>) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    println!("\t{:<6} min={:+.4e} max={:+.4e} km/s", name, lo, hi);
}




// ============================================================================
fn main() -> anyhow::Result<()> {
    init_logging();

    println!();
    println!("\t{}", app::DESCRIPTION);
    println!("\tv{}", app::VERSION);
    println!();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let model = load_model(&args)?;

    for line in serde_yaml::to_string(&model)?.lines().skip(1) {
        println!("\t{}", line);
    }
    println!();

    let start = std::time::Instant::now();
    let field = pipeline::run(&model)?;
    let (n0, n1) = field.shape();

    println!("\tmesh   {} x {} ({:?})", n0, n1, model.grid_type);
    summarize("v_r", &field.v_r);
    summarize("v_phi", &field.v_phi);
    println!("\tfinished in {:.3}s", start.elapsed().as_secs_f64());

    Ok(())
}
