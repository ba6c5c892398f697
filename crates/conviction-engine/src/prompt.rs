//! Prompt construction for the reasoning service.

use pick_core::types::{Market, Opportunity};

/// Cap on the rendered signal payload; detector payloads can be large.
const MAX_SIGNAL_DETAIL_CHARS: usize = 500;

/// Build the analysis prompt for one opportunity. The response contract
/// is strict JSON; `Judgment::parse` still tolerates fenced output.
pub fn build_prompt(market: &Market, opportunity: &Opportunity, news_digest: &str) -> String {
    let mut prompt = format!(
        "You are a prediction market analyst. Evaluate this trading opportunity.\n\n\
         MARKET\n\
         Question: {}\n\
         Category: {}\n\
         YES price: {}\n\
         NO price: {}\n\
         Volume: {}\n\
         Liquidity: {}\n",
        market.question,
        market.category.as_deref().unwrap_or("unknown"),
        market.yes_price,
        market.no_price,
        market.volume,
        market.liquidity,
    );

    if let Some(end_date) = market.end_date {
        prompt.push_str(&format!("Ends: {}\n", end_date.format("%Y-%m-%d %H:%M UTC")));
    }

    let detail: String = opportunity
        .signal_data
        .to_string()
        .chars()
        .take(MAX_SIGNAL_DETAIL_CHARS)
        .collect();
    prompt.push_str(&format!(
        "\nSIGNAL\n\
         Type: {}\n\
         Strength: {:.2}\n\
         Detail: {}\n",
        opportunity.signal_type.as_str(),
        opportunity.strength,
        detail,
    ));

    if !news_digest.is_empty() {
        prompt.push_str(&format!("\nRECENT NEWS\n{news_digest}\n"));
    }

    prompt.push_str(
        "\nRespond with ONLY a JSON object, no markdown, no commentary:\n\
         {\n\
           \"direction\": \"YES\" or \"NO\",\n\
           \"conviction_score\": <0-100>,\n\
           \"entry_price\": <0-1>,\n\
           \"target_price\": <0-1>,\n\
           \"stop_loss\": <0-1, 0 if none>,\n\
           \"risk_reward\": <ratio>,\n\
           \"time_horizon\": \"hours\" | \"days\" | \"weeks\",\n\
           \"edge_explanation\": \"<why the market is mispriced>\",\n\
           \"summary\": \"<one-line recommendation>\",\n\
           \"confidence_factors\": [\"...\"],\n\
           \"risk_factors\": [\"...\"],\n\
           \"position_size_suggestion\": \"small\" | \"medium\" | \"large\"\n\
         }\n\
         Be conservative: a conviction_score above 60 means you would take \
         this trade with real money.",
    );

    prompt
}
