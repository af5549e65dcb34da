use agentflow::PlannerBuilder;

fn main() {
    let planner = PlannerBuilder::new().build().unwrap();

    let text = include_str!("./workflow.json");

    let workflow = planner.load(text).unwrap();

    let result = planner.validate(&workflow);
    println!("Valid: {}", result.is_valid());

    let plan = planner.plan(&workflow).unwrap();
    for step in plan.steps.iter() {
        let branch = match step.branch {
            Some(true) => " [true]",
            Some(false) => " [false]",
            None => "",
        };
        println!("{:>2} {:<10} {:<11} after {:?} ({}){}", step.depth, step.node_id, step.kind.as_ref(), step.depends_on, step.join_policy.as_ref(), branch);
    }

    let plan_json = serde_json::to_string_pretty(&plan).unwrap();
    println!("Plan: {}", plan_json);
}
