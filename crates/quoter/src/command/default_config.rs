use quoter_client::settings::DEFAULT_CONFIG;

pub fn run() {
    println!("{DEFAULT_CONFIG}");
}
