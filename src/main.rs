use clap::Parser;
use lpass_cred::cli::Cli;

fn main() {
    let cli = Cli::parse();
    lpass_cred::logging::init(cli.verbose);

    let result = lpass_cred::cli::run::execute(&cli);
    lpass_cred::cli::output::emit(&result, cli.output);

    if result.failed {
        std::process::exit(1);
    }
}
