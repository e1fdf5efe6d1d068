#[macro_use]
extern crate rocket;

use block_the_pig::bot;
use block_the_pig::config::Config;
use log::{error, info};
use rocket::fairing::AdHoc;
use std::env;

mod handler;

#[launch]
fn rocket() -> _ {
    // Lots of web hosting services expect you to bind to the port specified by the `PORT`
    // environment variable. However, Rocket looks at the `ROCKET_PORT` environment variable.
    // If we find a value for `PORT`, we set `ROCKET_PORT` to that value.
    if let Ok(port) = env::var("PORT") {
        env::set_var("ROCKET_PORT", &port);
    }

    // We default to 'info' level logging. But if the `RUST_LOG` environment variable is set,
    // we keep that value instead.
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }

    env_logger::init();

    info!("Starting block-the-pig server...");

    // Load configuration once at startup
    let config = Config::load_or_default();
    let bot = match bot::Bot::new(config) {
        Ok(bot) => bot,
        Err(e) => {
            error!("Configured grid is unusable ({}), using hardcoded defaults", e);
            // The hardcoded grid is the reference board, which always builds
            match bot::Bot::new(Config::default_hardcoded()) {
                Ok(bot) => bot,
                Err(e) => panic!("default configuration rejected: {}", e),
            }
        }
    };

    rocket::build()
        .manage(bot)
        .attach(AdHoc::on_response("Server ID Middleware", |_, res| {
            Box::pin(async move {
                res.set_raw_header("Server", "block-the-pig");
            })
        }))
        .mount("/", routes![handler::index, handler::get_move])
}
