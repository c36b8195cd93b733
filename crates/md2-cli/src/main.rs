use std::process;

fn main() {
    match md2_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("md2 error: {err}");
            process::exit(1);
        }
    }
}
