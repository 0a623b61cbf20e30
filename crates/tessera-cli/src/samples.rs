//! Bundled sample blueprints used by `tessera synth`.

use serde_json::json;
use tessera_core::{
    Agent, CatchBlock, ConfigValue, EnvVar, ForConfig, HttpCallConfig, McpServer, ObjectRef,
    RaiseConfig, RefError, RuntimeSource, SetConfig, Skill, StringRef, SwitchConfig, Task,
    TryConfig, WaitConfig, Workflow,
};
use tessera_synth::Context;

pub const NAMESPACE: &str = "samples";

/// Register the sample workflows and agent into `ctx`.
pub fn build(ctx: &mut Context) -> Result<(), RefError> {
    let api = ctx.set_string("api", "https://api.example.com");
    let token = ctx.runtime_string("token", RuntimeSource::Secret("API_TOKEN".into()));
    let region = ctx.runtime_string("region", RuntimeSource::Env("REGION".into()));
    let limits = ctx.set_object("limits", json!({"batch": 25, "retry_after": 30}))?;

    ctx.register_workflow(order_digest(&api, &token, &region, &limits)?);
    ctx.register_workflow(reminder());
    ctx.register_agent(support_agent());
    Ok(())
}

fn order_digest(
    api: &StringRef,
    token: &StringRef,
    region: &StringRef,
    limits: &ObjectRef,
) -> Result<Workflow, RefError> {
    let auth = token.prepend("Bearer ");
    let batch = limits
        .field("batch")?
        .as_int()
        .ok_or_else(|| RefError::type_mismatch("as_int", "limits.batch"))?;
    let retry_after = limits
        .field("retry_after")?
        .as_int()
        .ok_or_else(|| RefError::type_mismatch("as_int", "limits.retry_after"))?;

    let fetch = Task::new(
        "fetchOrders",
        HttpCallConfig::get(api.concat("/orders"))
            .header("Authorization", &auth)
            .header("X-Region", region.upper())
            .body([("limit", batch.multiply(2)?)].into_iter().collect::<ConfigValue>())
            .timeout_seconds(30),
    );

    let status = fetch.field("status");
    let route = Task::new(
        "route",
        SwitchConfig::new()
            .case(status.equals("empty"), "nothingToDo")
            .default_to("eachOrder"),
    );

    let each = ForConfig::new("order", &fetch.field_object("orders"));
    let order_id = each
        .item()
        .field("id")?
        .as_string()
        .ok_or_else(|| RefError::type_mismatch("as_string", "order.id"))?;
    let submit = Task::new(
        "submit",
        HttpCallConfig::post(api.concat("/digest/").concat(&order_id)).header("Authorization", &auth),
    );
    let guarded = Task::new(
        "guardedSubmit",
        TryConfig::new(vec![submit]).catch(
            CatchBlock::new("err", vec![Task::new("backoff", WaitConfig::new(retry_after))])
                .errors(["Timeout", "Unavailable"]),
        ),
    );
    let loop_task = Task::new("eachOrder", each.task(guarded)).then("summarize");

    let summarize = Task::new(
        "summarize",
        SetConfig::new()
            .var("count", fetch.field_int("count"))
            .var("headline", StringRef::from("Orders in ").concat(region)),
    )
    .end();
    let nothing = Task::new(
        "nothingToDo",
        RaiseConfig::new("NoOrders", "no orders to digest").data(json!({"retry": true})),
    )
    .end();

    Ok(Workflow::new(NAMESPACE, "order-digest")
        .version("1.0.0")
        .description("Digest open orders per region")
        .env(EnvVar::new("REGION").description("Deployment region").default_value("eu"))
        .task(fetch)
        .task(route)
        .task(loop_task)
        .task(summarize)
        .task(nothing))
}

fn reminder() -> Workflow {
    Workflow::new(NAMESPACE, "reminder")
        .description("Wait, then nudge")
        .task(Task::new("pause", WaitConfig::new(3600)))
        .task(Task::new("nudge", SetConfig::new().var("sent", true)).end())
}

fn support_agent() -> Agent {
    Agent::new("support", "Answer order questions using the order API.")
        .description("Customer support assistant")
        .model("default")
        .skill(Skill::new("tone", "Be brief and friendly.").description("Voice guidelines"))
        .mcp_server(McpServer::stdio("orders", "orders-mcp", ["--read-only"]).env("REGION", "eu"))
        .env(EnvVar::secret("ORDERS_API_KEY"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_config::SynthConfig;

    #[test]
    fn samples_register_two_workflows_and_one_agent() {
        let mut ctx = Context::new(SynthConfig::default());
        build(&mut ctx).unwrap();
        assert_eq!(ctx.registry().workflows().len(), 2);
        assert_eq!(ctx.registry().agents().len(), 1);
    }

    #[test]
    fn samples_convert_cleanly() {
        let mut ctx = Context::new(SynthConfig::default());
        build(&mut ctx).unwrap();
        let outcome = ctx.synthesize().unwrap();
        assert!(outcome.summary().starts_with("dry run: converted 2 workflow(s) and 1 agent(s)"));
    }
}
