use std::process;

fn main() {
    if let Err(err) = chatgrid::cli::main() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
