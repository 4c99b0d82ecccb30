//! Plugins shipped with the crate.

use super::Plugin;

/// Render a planning prompt made of an opening line, the objective, and numbered focus
/// areas the planner should cover.
fn structured_prompt(opening: &str, objective: &str, areas: &[&str], closing: &str) -> String {
    let mut prompt = format!("{}\n\nObjective: {}\n\n", opening, objective);
    for (index, area) in areas.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", index + 1, area));
    }
    prompt.push('\n');
    prompt.push_str(closing);
    prompt
}

fn product_development(objective: &str) -> String {
    structured_prompt(
        "Plan the development of the following product:",
        objective,
        &[
            "Market research and target users",
            "Core features and requirements",
            "Design and prototyping",
            "Technical architecture and implementation",
            "Testing and quality assurance",
            "Launch and go-to-market strategy",
        ],
        "Split the work into sub-tasks a product team could pick up independently.",
    )
}

fn project_planning(objective: &str) -> String {
    structured_prompt(
        "Develop a comprehensive project plan for the following objective:",
        objective,
        &[
            "Scope, goals and success criteria",
            "Stakeholders, roles and communication",
            "Work breakdown and milestones",
            "Timeline and schedule",
            "Budget and resource allocation",
            "Risks and mitigation",
            "Monitoring and reporting",
        ],
        "Each sub-task should produce one section of the plan.",
    )
}

fn complex_problem_solving(objective: &str) -> String {
    structured_prompt(
        "Solve the following complex problem step by step:",
        objective,
        &[
            "Restate the problem and its constraints",
            "Identify root causes and contributing factors",
            "Generate alternative solutions",
            "Evaluate the alternatives against the constraints",
            "Recommend a solution with an implementation outline",
        ],
        "Break the analysis into sub-tasks that can be investigated separately.",
    )
}

fn educational_content(objective: &str) -> String {
    structured_prompt(
        "Create educational content on the following topic:",
        objective,
        &[
            "Learning objectives and audience level",
            "Course outline and lesson sequence",
            "Explanations with worked examples",
            "Exercises and assessments",
            "Further reading and resources",
        ],
        "Produce sub-tasks that each yield a self-contained piece of the material.",
    )
}

fn innovation_management(objective: &str) -> String {
    structured_prompt(
        "Drive an innovation initiative for the following objective:",
        objective,
        &[
            "Opportunity and trend scan",
            "Idea generation",
            "Idea evaluation and prioritization",
            "Experiment and pilot design",
            "Scaling and organizational adoption",
        ],
        "Frame each sub-task so it ends with a concrete recommendation.",
    )
}

fn customer_support(objective: &str) -> String {
    structured_prompt(
        "Address the following customer support objective:",
        objective,
        &[
            "Understand the customer's issue and context",
            "Diagnose likely causes",
            "Step-by-step resolution",
            "Preventive measures and documentation",
            "Follow-up communication",
        ],
        "Keep the tone helpful and every sub-task actionable for a support agent.",
    )
}

fn research_analysis(objective: &str) -> String {
    structured_prompt(
        "Conduct a research analysis on the following topic:",
        objective,
        &[
            "Background and key questions",
            "Sources and data collection methods",
            "Analysis of findings",
            "Limitations and open questions",
            "Conclusions and implications",
        ],
        "Each sub-task should investigate one research question in depth.",
    )
}

fn content_creation(objective: &str) -> String {
    structured_prompt(
        "Create content for the following objective:",
        objective,
        &[
            "Audience and purpose",
            "Key messages and structure",
            "Drafting of each section",
            "Tone, style and formatting",
            "Review and distribution",
        ],
        "Divide the writing into sections that can be drafted in parallel.",
    )
}

fn comparative_analysis(objective: &str) -> String {
    structured_prompt(
        "Conduct a comparative analysis on the following topic:",
        objective,
        &[
            "A clear aspect or criterion to compare",
            "What to investigate for each subject",
            "Methods or sources for comparative data",
            "Specific points of contrast to focus on",
        ],
        "Break the analysis into several comparison tasks, one criterion each.",
    )
}

fn scenario_planning(objective: &str) -> String {
    structured_prompt(
        "Develop scenarios for the following objective:",
        objective,
        &[
            "Driving forces and key uncertainties",
            "Plausible future scenarios",
            "Implications of each scenario",
            "Early warning indicators",
            "Robust strategies across scenarios",
        ],
        "Create one sub-task per scenario or per cross-cutting analysis.",
    )
}

/// Every built-in plugin, in registration order.
pub fn builtin_plugins() -> Vec<Plugin> {
    vec![
        Plugin::new(
            "product_development",
            "Plans a product from market research to launch.",
            product_development,
        ),
        Plugin::new(
            "project_planning",
            "Builds a detailed project plan covering scope, schedule, budget and risk.",
            project_planning,
        ),
        Plugin::new(
            "complex_problem_solving",
            "Decomposes a hard problem into analysis and solution steps.",
            complex_problem_solving,
        ),
        Plugin::new(
            "educational_content",
            "Designs lessons, examples and exercises on a topic.",
            educational_content,
        ),
        Plugin::new(
            "innovation_management",
            "Runs an innovation initiative from idea scan to adoption.",
            innovation_management,
        ),
        Plugin::new(
            "customer_support",
            "Resolves a customer issue with diagnosis and follow-up.",
            customer_support,
        ),
        Plugin::new(
            "research_analysis",
            "Structures a research investigation and its findings.",
            research_analysis,
        ),
        Plugin::new(
            "content_creation",
            "Plans and drafts written content for an audience.",
            content_creation,
        ),
        Plugin::new(
            "comparative_analysis",
            "Compares subjects criterion by criterion.",
            comparative_analysis,
        ),
        Plugin::new(
            "scenario_planning",
            "Explores future scenarios and robust strategies.",
            scenario_planning,
        ),
    ]
}
