/// Shared system prompt for every reading call, freeform or structured.
pub const SYSTEM_PROMPT: &str = r#"You are an expert research assistant who reads academic papers closely and explains them with precision.

Ground every statement in the paper text you are given. Quote or paraphrase the paper rather than inventing claims; when the paper is silent on something, say so. Keep mathematical notation as the paper writes it. Write in clear markdown with headings and bullet lists where they help.

Never pad your answer with generic commentary about the field. Everything you write should be specific to this paper."#;

/// Step 1 — orientation pass over the whole paper.
pub const QUICK_SCAN: &str = r#"Do a quick first-pass scan of the paper below. Produce:

1. **Problem** — what gap or question the paper addresses, in 2-3 sentences.
2. **Approach** — the core method or idea, in plain language.
3. **Key claims** — the 3-5 main results or contributions as stated by the authors.
4. **Structure map** — one line per major section saying what it contains.

Stay under 500 words. Do not evaluate the work yet; just map it.

The paper:

{markdown}"#;

/// Step 2 — detailed technical walkthrough, building on the scan.
pub const DEEP_DIVE: &str = r#"You previously scanned this paper and produced:

{response[0]}

Now do a deep technical dive. Work through the method section by section:

- Explain the central mechanism or algorithm step by step, including the notation the paper uses.
- State the assumptions the method depends on, explicit or implicit.
- Summarize the experimental setup: datasets, baselines, metrics.
- Report the main quantitative results with the actual numbers from the paper.
- Note anything the scan above got wrong or oversimplified.

The paper:

{markdown}"#;

/// Step 3 — critical evaluation, building on both prior passes.
pub const CRITICAL_THINKING: &str = r#"You have already scanned and analyzed this paper:

--- Quick scan ---
{response[0]}

--- Deep dive ---
{response[1]}

Now think critically about it:

1. **Strengths** — what is genuinely novel or well-executed, and why.
2. **Weaknesses** — gaps in the evaluation, unstated limitations, claims the evidence does not fully support.
3. **Threats to validity** — confounds, baseline choices, or metric issues that could change the conclusions.
4. **Open questions** — what a follow-up paper would need to answer.
5. **Verdict** — one paragraph: who should read this paper and what they should take away.

Be specific; every criticism must point at something concrete in the paper.

The paper:

{markdown}"#;
