use log::{error, warn};

use stackwm::{utils::command, Config, Display, WindowManager, VERSION};

fn usage() {
    println!("usage: stackwm [-v|--version]");
}

fn main() {
    let mut args = std::env::args().skip(1);
    if let Some(arg) = args.next() {
        match arg.as_str() {
            "-v" | "--version" => println!("{}", VERSION),
            _ => usage(),
        }
        return;
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    command::ignore_children();

    let display = match Display::new() {
        Ok(display) => display,
        Err(e) => {
            error!("{:#}", e);
            return;
        }
    };
    let config = Config::load().unwrap_or_else(|e| {
        warn!("{:#}, using defaults", e);
        Config::default()
    });

    if let Err(e) = WindowManager::new(display, config).run() {
        error!("{:#}", e);
    }
}
