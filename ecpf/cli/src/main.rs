//! Command-line interface for ECPF.  Almost all of the work happens in `ecpf_cli`, which is shared
//! with the tests.

use ecpf_cli::args::CliArgs;
use structopt::StructOpt;

fn main() -> anyhow::Result<()> {
    let args = CliArgs::from_args();
    ecpf_cli::init_logging(args.log_level())?;

    if let Some(result) = ecpf_cli::run(&args.input_file, &args.options)? {
        result.print()?;
    }
    Ok(())
}
