use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::AuthService;
use crate::configuration::HttpSettings;
use crate::middleware::{LoggerMiddleware, TokenGate};
use crate::routes::{
    create_user, delete_user, get_user, health_check, login, logout, update_user, validate,
    whoami,
};

pub fn run(
    listener: TcpListener,
    auth: AuthService,
    http: HttpSettings,
) -> Result<Server, std::io::Error> {
    let auth_data = web::Data::new(auth.clone());
    let http_data = web::Data::new(http.clone());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(LoggerMiddleware)
            .app_data(auth_data.clone())
            .app_data(http_data.clone())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope(&http.api_version)
                    // Public routes
                    .route("/login", web::post().to(login))
                    .route("/logout", web::get().to(logout))
                    .route("/user", web::post().to(create_user))
                    .route("/user", web::put().to(update_user))
                    .route("/user/{login}", web::get().to(get_user))
                    .route("/user/{login}", web::delete().to(delete_user))
                    .route("/rpc/validate", web::post().to(validate))
                    // Routes behind the token gate
                    .service(
                        web::resource("/i")
                            .wrap(TokenGate::new(auth.clone(), http.clone()))
                            .route(web::get().to(whoami)),
                    )
                    .service(
                        web::resource("/validate")
                            .wrap(TokenGate::new(auth.clone(), http.clone()))
                            .route(web::get().to(whoami)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
