use registry_notify::cli::{Args, Runner};

#[tokio::main]
async fn main() {
    let args = Args::parse_args().from_env();
    let code = Runner::new(args).run().await;
    std::process::exit(code);
}
