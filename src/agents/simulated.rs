//! Simulated capability providers.
//!
//! Each built-in agent name has a provider here that does no network I/O.
//! The providers check the same required inputs as their live counterparts
//! and return structured output of the same shape. Pseudo-random values are
//! derived from a SHA-256 of the input, so the same input always produces
//! the same payload.

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::agents::contract::{Agent, AgentError, Payload};
use crate::agents::registry::AgentRegistry;
use crate::config::Settings;

/// Register one simulated provider per built-in agent name.
pub fn register_simulated(registry: &mut AgentRegistry, settings: &Settings) {
    registry.register("prospect_search", Box::new(ProspectSearch::new(settings)));
    registry.register("enrichment", Box::new(DataEnrichment));
    registry.register("scoring", Box::new(Scoring::new(settings)));
    registry.register("outreach_content", Box::new(OutreachContent));
    registry.register(
        "outreach_executor",
        Box::new(OutreachExecutor {
            dry_run: settings.runtime.dry_run,
        }),
    );
    registry.register("response_tracker", Box::new(ResponseTracker));
    registry.register("feedback_trainer", Box::new(FeedbackTrainer));
}

/// Deterministic draws in `[0, 1)` keyed by the input and a label.
struct Seed(String);

impl Seed {
    fn of(input: &Payload) -> Self {
        Self(serde_json::to_string(input).unwrap_or_default())
    }

    fn unit(&self, label: &str) -> f64 {
        let hash = Sha256::digest(format!("{}|{}", self.0, label).as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash[..8]);
        (u64::from_be_bytes(bytes) >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&self, label: &str, min: f64, max: f64) -> f64 {
        min + (max - min) * self.unit(label)
    }

    fn tag(&self) -> String {
        let hash = Sha256::digest(self.0.as_bytes());
        hex::encode(&hash[..4])
    }
}

fn list<'a>(input: &'a Payload, key: &str) -> Option<&'a Vec<Value>> {
    input.get(key).and_then(Value::as_array)
}

fn is_list_of_mappings(input: &Payload, key: &str) -> bool {
    list(input, key).is_some_and(|items| items.iter().all(Value::is_object))
}

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round3(part as f64 / whole as f64)
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn bounds(icp: &Map<String, Value>, key: &str, default: (f64, f64)) -> (f64, f64) {
    let range = icp.get(key);
    let min = range
        .and_then(|r| r.get("min"))
        .and_then(Value::as_f64)
        .unwrap_or(default.0);
    let max = range
        .and_then(|r| r.get("max"))
        .and_then(Value::as_f64)
        .unwrap_or(default.1);
    (min, max.max(min))
}

fn strings(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => Payload::new(),
    }
}

/// Companies returned by one simulated search, at most.
const SIMULATED_RESULTS: usize = 5;

const COMPANY_STEMS: &[&str] = &[
    "Northwind", "Bluepeak", "Cobalt", "Lumen", "Quarry", "Summit", "Tidal", "Vertex",
];
const TITLES: &[&str] = &["VP of Sales", "Head of Sales", "Sales Director", "VP of Marketing"];
const SIGNALS: &[&str] = &["recent_funding", "hiring_sales", "new_product", "general_outreach"];

/// `ProspectSearchAgent`: finds leads matching an ideal customer profile.
pub struct ProspectSearch {
    max_leads: usize,
}

impl ProspectSearch {
    pub fn new(settings: &Settings) -> Self {
        Self {
            max_leads: settings.runtime.max_leads_per_run,
        }
    }
}

impl Agent for ProspectSearch {
    fn name(&self) -> &str {
        "ProspectSearchAgent"
    }

    fn validate(&self, input: &Payload) -> bool {
        input.get("icp").is_some_and(Value::is_object)
    }

    fn run(&mut self, input: &Payload) -> Result<Payload, AgentError> {
        let icp = input
            .get("icp")
            .and_then(Value::as_object)
            .ok_or_else(|| AgentError::InvalidInput("icp must be a mapping".to_string()))?;
        let seed = Seed::of(input);

        let requested = input
            .get("max_leads")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(self.max_leads);
        let count = requested.min(self.max_leads).min(SIMULATED_RESULTS);

        let industries = strings(icp.get("industry"));
        let locations = strings(icp.get("location"));
        let (size_min, size_max) = bounds(icp, "employee_count", (100.0, 1000.0));
        let (revenue_min, revenue_max) = bounds(icp, "revenue", (20_000_000.0, 200_000_000.0));

        let leads: Vec<Value> = (0..count)
            .map(|i| {
                let company = format!("{} {}", COMPANY_STEMS[i], seed.tag());
                let domain = format!("{}.com", company.to_lowercase().replace(' ', ""));
                let last_name = format!("Doe{}", i + 1);
                json!({
                    "company": company,
                    "company_domain": domain,
                    "contact_name": format!("Jordan {}", last_name),
                    "email": format!("jordan.{}@{}", last_name.to_lowercase(), domain),
                    "title": TITLES[i % TITLES.len()],
                    "signal": SIGNALS[(seed.unit(&format!("signal:{}", i)) * SIGNALS.len() as f64) as usize % SIGNALS.len()],
                    "company_size": seed.range(&format!("size:{}", i), size_min, size_max).round() as u64,
                    "revenue": seed.range(&format!("revenue:{}", i), revenue_min, revenue_max).round() as u64,
                    "industry": industries.get(i % industries.len().max(1)).cloned().unwrap_or_else(|| "SaaS".to_string()),
                    "location": locations.first().cloned().unwrap_or_else(|| "USA".to_string()),
                })
            })
            .collect();

        tracing::debug!(leads = leads.len(), "Simulated prospect search");
        Ok(payload(json!({
            "total_found": leads.len(),
            "leads": leads,
            "companies_searched": count,
            "search_timestamp": chrono::Utc::now().to_rfc3339(),
            "icp_criteria": icp,
            "signals_used": input.get("signals").cloned().unwrap_or_else(|| json!([])),
        })))
    }
}

/// `DataEnrichmentAgent`: adds firmographic detail to leads.
pub struct DataEnrichment;

impl Agent for DataEnrichment {
    fn name(&self) -> &str {
        "DataEnrichmentAgent"
    }

    fn validate(&self, input: &Payload) -> bool {
        is_list_of_mappings(input, "leads")
    }

    fn run(&mut self, input: &Payload) -> Result<Payload, AgentError> {
        let leads = list(input, "leads").cloned().unwrap_or_default();
        let seed = Seed::of(input);

        let enriched: Vec<Value> = leads
            .into_iter()
            .enumerate()
            .map(|(i, mut lead)| {
                let funding = ["seed", "series_a", "series_b", "series_c"]
                    [(seed.unit(&format!("funding:{}", i)) * 4.0) as usize % 4];
                if let Value::Object(map) = &mut lead {
                    map.insert(
                        "enrichment".to_string(),
                        json!({
                            "funding_stage": funding,
                            "growth_rate": round3(seed.range(&format!("growth:{}", i), 0.05, 0.6)),
                            "technologies": ["Salesforce", "HubSpot"],
                            "enriched": true,
                        }),
                    );
                }
                lead
            })
            .collect();

        let total = enriched.len();
        Ok(payload(json!({
            "enriched_leads": enriched,
            "total_enriched": total,
            "successful_enrichments": total,
            "enrichment_rate": if total == 0 { 0.0 } else { 1.0 },
        })))
    }
}

/// `ScoringAgent`: weights and ranks enriched leads.
pub struct Scoring {
    weights: Map<String, Value>,
    threshold: f64,
    icp: Map<String, Value>,
}

impl Scoring {
    pub fn new(settings: &Settings) -> Self {
        Self {
            weights: settings
                .scoring
                .get("weights")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            threshold: settings.min_score_threshold(),
            icp: settings.icp.clone(),
        }
    }

    fn weight(&self, key: &str) -> f64 {
        self.weights.get(key).and_then(Value::as_f64).unwrap_or(0.25)
    }

    fn in_range(&self, value: Option<f64>, key: &str) -> f64 {
        let (min, max) = bounds(&self.icp, key, (0.0, f64::MAX));
        match value {
            Some(v) if v >= min && v <= max => 1.0,
            Some(_) => 0.4,
            None => 0.0,
        }
    }
}

impl Agent for Scoring {
    fn name(&self) -> &str {
        "ScoringAgent"
    }

    fn validate(&self, input: &Payload) -> bool {
        is_list_of_mappings(input, "enriched_leads")
    }

    fn run(&mut self, input: &Payload) -> Result<Payload, AgentError> {
        let leads = list(input, "enriched_leads").cloned().unwrap_or_default();
        let industries = strings(self.icp.get("industry"));

        let mut scored: Vec<(f64, Value)> = leads
            .into_iter()
            .map(|lead| {
                let industry_match = if industries.iter().any(|i| i == text(&lead, "industry")) {
                    1.0
                } else {
                    0.3
                };
                let size = self.in_range(lead.get("company_size").and_then(Value::as_f64), "employee_count");
                let revenue = self.in_range(lead.get("revenue").and_then(Value::as_f64), "revenue");
                let growth = lead
                    .pointer("/enrichment/growth_rate")
                    .and_then(Value::as_f64)
                    .map(|rate| (rate / 0.5).min(1.0))
                    .unwrap_or(0.0);

                let score = round3(
                    industry_match * self.weight("industry_match")
                        + size * self.weight("company_size")
                        + revenue * self.weight("revenue_range")
                        + growth * self.weight("growth_signals"),
                );
                (score, lead)
            })
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let total = scored.len();
        let average = if total == 0 {
            0.0
        } else {
            round3(scored.iter().map(|(score, _)| score).sum::<f64>() / total as f64)
        };
        let ranked: Vec<Value> = scored
            .into_iter()
            .enumerate()
            .map(|(i, (score, lead))| {
                json!({
                    "lead": lead,
                    "score": score,
                    "rank": i + 1,
                    "meets_threshold": score >= self.threshold,
                })
            })
            .collect();
        let qualified = ranked
            .iter()
            .filter(|r| r["meets_threshold"] == json!(true))
            .count();

        Ok(payload(json!({
            "ranked_leads": ranked,
            "total_scored": total,
            "qualified_leads": qualified,
            "avg_score": average,
        })))
    }
}

/// `OutreachContentAgent`: drafts one message per ranked lead.
pub struct OutreachContent;

impl Agent for OutreachContent {
    fn name(&self) -> &str {
        "OutreachContentAgent"
    }

    fn validate(&self, input: &Payload) -> bool {
        is_list_of_mappings(input, "ranked_leads")
    }

    fn run(&mut self, input: &Payload) -> Result<Payload, AgentError> {
        let messages: Vec<Value> = list(input, "ranked_leads")
            .into_iter()
            .flatten()
            .filter_map(|ranked| {
                let lead = ranked.get("lead")?;
                let email = text(lead, "email");
                if email.is_empty() {
                    return None;
                }
                let first_name = text(lead, "contact_name")
                    .split_whitespace()
                    .next()
                    .unwrap_or("there");
                let company = text(lead, "company");
                Some(json!({
                    "lead_email": email,
                    "company": company,
                    "subject_line": format!("Quick idea for {}", company),
                    "email_body": format!(
                        "Hi {},\n\nTeams like {} use us to shorten their sales cycle. Open to a 15 minute call next week?\n",
                        first_name, company
                    ),
                    "score": ranked.get("score").cloned().unwrap_or(Value::Null),
                }))
            })
            .collect();

        Ok(payload(json!({
            "total_generated": messages.len(),
            "messages": messages,
        })))
    }
}

/// `OutreachExecutorAgent`: sends drafted messages.
pub struct OutreachExecutor {
    dry_run: bool,
}

impl Agent for OutreachExecutor {
    fn name(&self) -> &str {
        "OutreachExecutorAgent"
    }

    fn validate(&self, input: &Payload) -> bool {
        list(input, "messages").is_some_and(|messages| {
            messages.iter().all(|m| {
                ["lead_email", "subject_line", "email_body"]
                    .iter()
                    .all(|key| !text(m, key).is_empty())
            })
        })
    }

    fn run(&mut self, input: &Payload) -> Result<Payload, AgentError> {
        let seed = Seed::of(input);
        let messages = list(input, "messages").cloned().unwrap_or_default();

        let sent_status: Vec<Value> = messages
            .iter()
            .enumerate()
            .map(|(i, message)| {
                let status = if self.dry_run {
                    "dry_run"
                } else if seed.unit(&format!("bounce:{}", i)) < 0.05 {
                    "failed"
                } else {
                    "sent"
                };
                json!({
                    "lead_email": text(message, "lead_email"),
                    "status": status,
                    "message_id": format!("msg_{}_{}", seed.tag(), i + 1),
                })
            })
            .collect();

        let failed = sent_status.iter().filter(|s| s["status"] == "failed").count();
        let sent = sent_status.len() - failed;

        Ok(payload(json!({
            "campaign_id": format!("campaign_{}", seed.tag()),
            "sent_status": sent_status,
            "total_sent": sent,
            "total_failed": failed,
            "success_rate": ratio(sent, messages.len()),
            "campaign_metadata": {
                "dry_run": self.dry_run,
                "total_messages": messages.len(),
            },
        })))
    }
}

/// `ResponseTrackerAgent`: classifies engagement for a campaign.
pub struct ResponseTracker;

impl Agent for ResponseTracker {
    fn name(&self) -> &str {
        "ResponseTrackerAgent"
    }

    fn validate(&self, input: &Payload) -> bool {
        input
            .get("campaign_id")
            .and_then(Value::as_str)
            .is_some_and(|id| !id.is_empty())
    }

    fn run(&mut self, input: &Payload) -> Result<Payload, AgentError> {
        let seed = Seed::of(input);
        let delivered: Vec<&str> = list(input, "sent_status")
            .into_iter()
            .flatten()
            .filter(|s| s["status"] != "failed")
            .map(|s| text(s, "lead_email"))
            .collect();

        let mut classification: Map<String, Value> = Map::new();
        for bucket in ["hot", "warm", "cold"] {
            classification.insert(bucket.to_string(), json!([]));
        }
        let (mut opened, mut clicked, mut replied) = (0, 0, 0);

        let responses: Vec<Value> = delivered
            .iter()
            .map(|email| {
                let open = seed.unit(&format!("open:{}", email)) < 0.45;
                let click = open && seed.unit(&format!("click:{}", email)) < 0.35;
                let reply = open && seed.unit(&format!("reply:{}", email)) < 0.15;
                opened += usize::from(open);
                clicked += usize::from(click);
                replied += usize::from(reply);

                let bucket = if reply {
                    "hot"
                } else if open || click {
                    "warm"
                } else {
                    "cold"
                };
                if let Some(Value::Array(emails)) = classification.get_mut(bucket) {
                    emails.push(json!(email));
                }
                json!({
                    "lead_email": email,
                    "opened": open,
                    "clicked": click,
                    "replied": reply,
                    "classification": bucket,
                })
            })
            .collect();

        let count = |bucket: &str| classification.get(bucket).and_then(Value::as_array).map_or(0, Vec::len);
        let counts = json!({"hot": count("hot"), "warm": count("warm"), "cold": count("cold")});
        let total = delivered.len();

        Ok(payload(json!({
            "campaign_id": input.get("campaign_id").cloned().unwrap_or(Value::Null),
            "responses": responses,
            "metrics": {
                "total_tracked": total,
                "open_rate": ratio(opened, total),
                "click_rate": ratio(clicked, total),
                "reply_rate": ratio(replied, total),
            },
            "lead_classification": classification,
            "counts": counts,
        })))
    }
}

/// `FeedbackTrainerAgent`: turns campaign metrics into recommendations.
pub struct FeedbackTrainer;

impl Agent for FeedbackTrainer {
    fn name(&self) -> &str {
        "FeedbackTrainerAgent"
    }

    fn validate(&self, input: &Payload) -> bool {
        input.get("responses").is_some_and(Value::is_array)
            && input.get("campaign_metrics").is_some_and(Value::is_object)
    }

    fn run(&mut self, input: &Payload) -> Result<Payload, AgentError> {
        let metrics = input.get("campaign_metrics").cloned().unwrap_or_else(|| json!({}));
        let rate = |key: &str| metrics.get(key).and_then(Value::as_f64).unwrap_or(0.0);
        let sample_size = list(input, "responses").map_or(0, Vec::len);

        let mut recommendations = Vec::new();
        if rate("open_rate") < 0.3 {
            recommendations.push(json!({
                "area": "subject_lines",
                "recommendation": "Test shorter, company-specific subject lines",
                "priority": "high",
            }));
        }
        if rate("reply_rate") < 0.05 {
            recommendations.push(json!({
                "area": "personalization",
                "recommendation": "Reference the lead's growth signal in the first sentence",
                "priority": "medium",
            }));
        }
        if rate("click_rate") < 0.1 {
            recommendations.push(json!({
                "area": "call_to_action",
                "recommendation": "Replace the meeting ask with a single-link resource",
                "priority": "low",
            }));
        }
        if recommendations.is_empty() {
            recommendations.push(json!({
                "area": "maintain",
                "recommendation": "Engagement is healthy; keep the current sequence",
                "priority": "low",
            }));
        }

        Ok(payload(json!({
            "total_recommendations": recommendations.len(),
            "recommendations": recommendations,
            "performance_summary": {
                "sample_size": sample_size,
                "open_rate": rate("open_rate"),
                "click_rate": rate("click_rate"),
                "reply_rate": rate("reply_rate"),
            },
            "approval_status": "pending",
        })))
    }
}
