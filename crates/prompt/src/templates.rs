//! Fixed prompt templates and user-visible canned messages.
//!
//! The visible messages are in French, the canonical output language
//! of the assistant. Changing them is a behavior change, not a
//! cosmetic one: the end-to-end tests compare against them verbatim.

/// Instruction template for query normalization.
///
/// The generation capability must detect the source language among
/// the supported set, rewrite into standard French, and return only
/// the rewritten query with no greeting or explanation.
pub const NORMALIZE_TEMPLATE: &str = "\
You are a query cleaner and translator. The user typed a query that \
may be in French, English, Modern Standard Arabic, or Tunisian dialect \
(Derja).

YOUR TASK:
1. If the query is in Tunisian dialect or Modern Standard Arabic, translate it into standard French.
2. If it is already in French or English, clean it up and rewrite it concisely in standard French so it can serve as a factual search query.
3. Output ONLY the translated and normalized query, with no explanation and no greeting.

RAW QUERY: \"{{query}}\"
";

/// User prompt template for grounded answer composition.
pub const ANSWER_USER_TEMPLATE: &str = "\
Question du client :
{{query}}

Informations disponibles :
{{context}}
";

/// Fixed behavioral policy for answer composition.
///
/// The four rules come straight from the grounding contract: context
/// only, French output, fixed not-found fallback, and no meta
/// vocabulary leaking into the visible answer.
pub const ANSWER_SYSTEM_PROMPT: &str = "\
You are a multilingual travel sales assistant.

Instructions:
- Answer using ONLY the information supplied below the question; never invent trips, prices, or destinations
- Always respond in French
- If the supplied information does not answer the question, reply exactly: \
\"Désolé, je n'ai pas trouvé cette information dans ma base de voyages.\"
- Never mention the words \"context\", \"contexte\", \"documents\" or any retrieval mechanics in your answer; state the facts as if you knew them directly
- Keep your response concise and factual
";

/// Verbatim fallback when the corpus does not answer the question.
pub const NOT_FOUND_MESSAGE: &str =
    "Désolé, je n'ai pas trouvé cette information dans ma base de voyages.";

/// Verbatim rejection for queries classified out-of-topic.
pub const OFF_TOPIC_MESSAGE: &str = "Désolé, votre question semble sortir du domaine du voyage. \
Veuillez poser une question concernant les voyages.";

/// Prompt shown when the user submits an empty query.
pub const EMPTY_QUERY_MESSAGE: &str = "Veuillez entrer une requête pour commencer.";
