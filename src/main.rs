use actix_cors::Cors;
use actix_web::{delete, get, post, put, web, App, HttpResponse, HttpServer};
use mongodb::Client;
use serde::Deserialize;

use tripmate::{
    balance::compute_balance_from_trip, exchange::get_exchanges_from_trip,
    settings::Settings, store::TripStore, DepartedMembers, ExpenseReport, Member, NewExpense,
    ServerError, Trip,
};

#[derive(Deserialize)]
struct NewTripJson {
    name: String,
    #[serde(default)]
    members: Vec<Member>,
}

#[derive(Deserialize)]
struct BalanceQuery {
    #[serde(default)]
    active_only: bool,
}

#[put("/trips/{id}")]
async fn add_trip(
    store: web::Data<TripStore>,
    id: web::Path<String>,
    json: web::Json<NewTripJson>,
) -> Result<HttpResponse, ServerError> {
    let NewTripJson { name, members } = json.into_inner();
    let name = name.trim();
    if name.is_empty() {
        return Err(ServerError::BadRequest("trip name must not be empty".to_string()));
    }
    for (i, member) in members.iter().enumerate() {
        if members[..i].iter().any(|m| m.id == member.id) {
            return Err(ServerError::BadRequest(format!(
                "member \"{}\" listed twice",
                member.id
            )));
        }
    }

    let trip = Trip::new(id.into_inner(), name, members);
    store.create_trip(&trip).await?;
    tracing::info!(trip = %trip.id, members = trip.members.len(), "trip created");
    Ok(HttpResponse::Ok().body("Trip added"))
}

#[get("/trips/{id}/members")]
async fn get_members(
    store: web::Data<TripStore>,
    id: web::Path<String>,
) -> Result<HttpResponse, ServerError> {
    let trip = store.require_trip(&id).await?;
    Ok(HttpResponse::Ok().json(trip.members))
}

#[post("/trips/{id}/members")]
async fn add_member(
    store: web::Data<TripStore>,
    id: web::Path<String>,
    member: web::Json<Member>,
) -> Result<HttpResponse, ServerError> {
    let member = member.into_inner();
    store.add_member(&id, &member).await?;
    tracing::info!(trip = %id, member = %member.id, "member joined");
    Ok(HttpResponse::Ok().body("Member added"))
}

#[delete("/trips/{id}/members/{member_id}")]
async fn remove_member(
    store: web::Data<TripStore>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ServerError> {
    let (id, member_id) = path.into_inner();
    let member = store.remove_member(&id, &member_id).await?;
    tracing::info!(trip = %id, member = %member.id, "member left");
    Ok(HttpResponse::Ok().body("Member removed"))
}

#[get("/trips/{id}/expenses")]
async fn get_expenses(
    store: web::Data<TripStore>,
    id: web::Path<String>,
) -> Result<HttpResponse, ServerError> {
    let mut expenses = store.require_trip(&id).await?.expenses;
    expenses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    tracing::debug!(trip = %id, count = expenses.len(), "expenses listed");
    Ok(HttpResponse::Ok().json(expenses))
}

#[post("/trips/{id}/expenses")]
async fn add_expense(
    store: web::Data<TripStore>,
    id: web::Path<String>,
    expense: web::Json<NewExpense>,
) -> Result<HttpResponse, ServerError> {
    let trip = store.require_trip(&id).await?;
    let expense = expense.into_inner().record(&trip.members)?;
    trip.total_with(expense.amount)?;
    store.push_expense(&trip.id, &expense).await?;
    tracing::info!(
        trip = %trip.id,
        expense = %expense.id,
        amount = %expense.amount,
        "expense added"
    );
    Ok(HttpResponse::Ok().json(expense))
}

#[get("/trips/{id}/balance")]
async fn get_balance(
    store: web::Data<TripStore>,
    id: web::Path<String>,
    query: web::Query<BalanceQuery>,
) -> Result<HttpResponse, ServerError> {
    let trip = store.require_trip(&id).await?;
    let departed = if query.active_only {
        DepartedMembers::Exclude
    } else {
        DepartedMembers::Include
    };
    Ok(HttpResponse::Ok().json(compute_balance_from_trip(&trip, departed)))
}

#[get("/trips/{id}/exchanges")]
async fn get_exchanges(
    store: web::Data<TripStore>,
    id: web::Path<String>,
) -> Result<HttpResponse, ServerError> {
    let trip = store.require_trip(&id).await?;
    Ok(HttpResponse::Ok().json(get_exchanges_from_trip(&trip)))
}

#[get("/trips/{id}/report")]
async fn get_report(
    store: web::Data<TripStore>,
    id: web::Path<String>,
) -> Result<HttpResponse, ServerError> {
    let trip = store.require_trip(&id).await?;
    Ok(HttpResponse::Ok().json(ExpenseReport::from_trip(&trip)))
}

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!("tripmate={}", settings.app.level))
        .init();

    tracing::info!("Using database {}", settings.mongodb.database);
    let client = Client::with_uri_str(&settings.mongodb.uri).await?;
    let store = TripStore::connect(&client, &settings.mongodb.database).await?;

    let allowed_origin = settings.server.allowed_origin.clone();
    let addr = (settings.server.bind.clone(), settings.server.port);
    tracing::info!("Server listening on {}:{}", addr.0, addr.1);

    HttpServer::new(move || {
        let cors = match &allowed_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header(),
            None => Cors::permissive(),
        };
        App::new()
            .wrap(cors)
            .app_data(web::Data::new(store.clone()))
            .service(add_trip)
            .service(get_members)
            .service(add_member)
            .service(remove_member)
            .service(get_expenses)
            .service(add_expense)
            .service(get_balance)
            .service(get_exchanges)
            .service(get_report)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
