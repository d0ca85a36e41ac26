//! An echo service: `GET /api/echo/{text}` answers with the text as JSON, and
//! `GET /pages/hello?name=...` renders a greeting through a tiny template function.

use waymark::extractor::{Arguments, RequestContext, ResponseHeaders};
use waymark::router::builder::build_simple_router;
use waymark::router::mapping::parameter;
use waymark::router::Router;
use waymark::view::Model;

#[derive(Default)]
struct Echo;

impl Echo {
    fn echo(&self, mut args: Arguments) -> anyhow::Result<String> {
        Ok(args.take::<String>(0).unwrap_or_default())
    }
}

#[derive(Default)]
struct Pages;

impl Pages {
    fn hello(&self, mut args: Arguments) -> anyhow::Result<Model> {
        let name = args.take::<String>(0).unwrap_or_else(|| "stranger".to_owned());
        Ok(serde_json::json!({ "name": name }))
    }
}

fn render(
    template: &str,
    _request: &RequestContext,
    _response: &ResponseHeaders,
    model: Option<&Model>,
) -> anyhow::Result<String> {
    match (template, model.and_then(|m| m.get("name")).and_then(Model::as_str)) {
        ("hello", Some(name)) => Ok(format!("<h1>Hello, {}!</h1>", name)),
        _ => anyhow::bail!("unknown template `{}`", template),
    }
}

fn router() -> Router {
    build_simple_router(|route| {
        route.renderer(render);

        route.class::<Echo>("/api").restful().methods(|m| {
            m.get("/echo/{text}")
                .param(parameter::path::<String>("text"))
                .to(Echo::echo);
        });

        route.class::<Pages>("/pages").methods(|m| {
            m.get("/hello")
                .template("hello")
                .param(parameter::param::<String>("name").default_value("stranger"))
                .to(Pages::hello);
        });
    })
    .expect("routes are valid")
}

/// Start a server serving the echo router.
pub fn main() {
    env_logger::init();

    let addr = "127.0.0.1:7878";
    println!("Listening for requests at http://{}", addr);
    waymark::start(addr, router()).expect("server failed to start");
}
