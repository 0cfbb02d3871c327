use crate::form::FormProfile;

/// System prompt for the follow-up chat.
pub const CHAT_SYSTEM_PROMPT: &str = "You are RightScheme AI, an assistant that helps people in \
India find government welfare schemes they are eligible for. Answer in simple language. When you \
recommend schemes, start each one with a line of the form `## 🏛️ <Scheme Name>`, add a \
`**Match Score: N%**` line, and use the sections `📝 **About:**`, `✅ **Eligibility:**`, \
`💰 **Benefits:**`, `📄 **Documents Required:**` and `📋 **How to Apply:**`. For greetings or \
general questions, reply conversationally without that structure.";

/// Prompt sent when the profile form is submitted.
pub fn scheme_prompt(profile: &FormProfile) -> String {
    let support = if profile.support_needs.is_empty() {
        "Any".to_string()
    } else {
        profile
            .support_needs
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    };
    let state = &profile.state;

    format!(
        "Find the most relevant Indian government welfare schemes for this person.

User profile:
- State: {state}
- Age: {age}
- Gender: {gender}
- Category: {category}
- Social category: {social}
- Annual family income: {income}
- Sector: {sector}
- Disability: {disability}
- Support needed: {support}

Include both central government schemes and {state} state schemes.
Recommend 5 to 7 schemes, ordered from best to weakest match.

Use exactly this format for every scheme:

## 🏛️ <Scheme Name>
**Match Score: <0-100>%**
📝 **About:** <one or two sentences>
✅ **Eligibility:** <key criteria as bullet points>
💰 **Benefits:** <what the person receives>
📄 **Documents Required:** <bullet list>
📋 **How to Apply:** <steps, with the official website as a markdown link>

Do not add any text between schemes other than the format above.",
        age = profile.age,
        gender = profile.gender,
        category = profile.category,
        social = profile.social_category,
        income = profile.income,
        sector = profile.sector,
        disability = profile.disability,
    )
}
