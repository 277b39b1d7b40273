use statemap::commands::command_argument_builder;
use statemap::handlers;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    if !quiet {
        handlers::print_banner();
    }

    match chosen_command.subcommand() {
        Some(("discover", sub_matches)) => handlers::handle_discover(sub_matches, quiet).await,
        Some(("inspect", sub_matches)) => handlers::handle_inspect(sub_matches),
        None => {}
        _ => unreachable!("clap should ensure we don't get here"),
    }
}
