mod app;
mod cli;
mod logging;
mod subject;

use app::App;
use clap::Parser;
use cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_format, cli.verbose);

    println!("=== DELAYED CENTER-OUT TASK ===");
    println!("Platform: {}", std::env::consts::OS);
    println!("Architecture: {}", std::env::consts::ARCH);
    println!("Running {} trials.\n", cli.trials);

    let app = App::new(&cli)?;
    let report = app.run()?;
    report.print();

    Ok(())
}
