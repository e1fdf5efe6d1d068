// HTTP handler bindings for the block-the-pig API
//
// Thin wrappers that pull the Bot out of Rocket's managed state, hand it the
// deserialized request and serialize whatever it returns. Invalid boards come
// back as 422 with an error message.

use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use serde_json::{json, Value};

use block_the_pig::bot::Bot;
use block_the_pig::types::{MoveRequest, MoveResponse};

/// GET / endpoint
/// Returns engine metadata
#[get("/")]
pub fn index(bot: &rocket::State<Bot>) -> Json<Value> {
    Json(bot.info())
}

/// POST /api/move endpoint
/// Computes the wall to place for the submitted board
#[post("/api/move", format = "json", data = "<move_req>")]
pub async fn get_move(
    bot: &rocket::State<Bot>,
    move_req: Json<MoveRequest>,
) -> Result<Json<MoveResponse>, status::Custom<Json<Value>>> {
    bot.get_move(&move_req).await.map(Json).map_err(|e| {
        status::Custom(
            Status::UnprocessableEntity,
            Json(json!({ "error": e.to_string() })),
        )
    })
}
