//! Review-instruction prompt assembly.
//!
//! The template is fixed; only the diff text is interpolated. It directs the
//! model to reply with a single JSON object (the normalizer's preferred
//! input) and embeds a worked scoring example so the arithmetic and the JSON
//! shape stay stable across model versions. The final 32k-character cap is
//! enforced at the completion layer, not here, so the rubric itself is never
//! cut, only the trailing diff payload.

/// System instruction sent with every completion request.
pub const SYSTEM_PROMPT: &str =
    "You are a code review expert providing detailed analysis of code changes.";

/// Renders the full analysis prompt around `diff_content`.
pub fn build_analysis_prompt(diff_content: &str) -> String {
    format!(
        r#"You are a senior Python code reviewer. Analyze this code diff and respond with a single JSON object.

1. Code quality issues:
   - List each issue, explain why it's problematic, and reference file:line ranges.
   - Classify severity:
     - Critical defect (crash, security, data loss): -2.0..-3.0
     - Serious anti-pattern (God Class, Spaghetti Code, Shotgun Surgery): -1.0
     - Medium anti-pattern (Duplicated Code, Primitive Obsession, Magic Numbers, Long Parameter List): -0.5
     - Minor code smell (PEP8 violations, long lines, poor naming): -0.1

2. Good practices & design patterns:
   - Identify patterns (Factory, Strategy, Observer, Singleton, Context Manager, etc.).
   - Explain how and where each is applied.

3. Overall quality score (0-10) with justification:
   - Start from 10.0
   - Apply penalties sum(penalty_j) and bonuses sum(bonus_i):
     - Penalties per severity above.
     + Bonuses:
       + Design patterns used: +0.3 each (max +1.0)
       + Refactored inherited anti-pattern: +1.0
       + Added or improved tests: +0.5
       + Docstrings & type hints: +0.2
   - Clamp raw_score = min(10.0, max(0.0, 10.0 + sum(bonus_i) - sum(penalty_j)))
   - Apply complexity multiplier K:
     - Low (<=50 lines & <=2 files, trivial): K = 0.8
     - Medium (50-200 lines or mixed complexity): K = 1.0
     - High (>=200 lines & >=10 files or deep logic/security): K = 1.2
   - Compute overall_score = round(raw_score_clamped * K, 1)

4. Anti-patterns:
   - List each anti-pattern name.
   - Explain why it's bad.
   - Indicate status: "new" (introduced), "existing" (inherited), or "fixed" (removed).

5. Review comments:
   - Summarize reviewer feedback and note which comments were addressed or remain unresolved.

6. Few-shot example:

Findings                      | Category                    | Weight | MR Complexity | Delta
------------------------------|-----------------------------|--------|---------------|-----
Introduced God Class          | Serious anti-pattern        | -1.0   | Medium (1.0)  | -1.0
Added Factory for parser      | Design pattern              | +0.3   |               | +0.3
Duplicated code               | Medium anti-pattern         | -0.5   |               | -0.5
Added tests                   | Testing                     | +0.5   |               | +0.5
Subtotal before complexity    |                             |        |               | -0.7
Complexity multiplier (K=1.0) |                             |        |               | x1.0
Final MR score                |                             |        |               | 9.3

Example output:
```json
{{
  "quality_issues": [
    "God Class in models/user.py:1-200 - class handles too many responsibilities",
    "Duplicated data formatting logic in utils.py:50-60 and report.py:120-130"
  ],
  "good_practices": [
    "Factory pattern used to instantiate parser based on file type",
    "Added unit tests for edge cases"
  ],
  "patterns": [
    "Factory"
  ],
  "anti_patterns": [
    "God Class",
    "Duplicated Code"
  ],
  "overall_score": 9.3
}}
```

Code diff:
{diff_content}
"#
    )
}
