use crate::models::{Profile, PromptAnswer};
use crate::services::llm::{ChatCompletion, ChatRequest};
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

const NAMES: &[&str] = &[
    "Alex", "Sam", "Jordan", "Taylor", "Casey", "Morgan", "Drew", "Jesse", "Quinn", "Dana",
];

const BIOS: &[&str] = &[
    "Love traveling and cooking",
    "Fitness enthusiast",
    "Tech geek into AI",
    "Music lover and aspiring DJ",
    "Dog parent, coffee addict",
];

const INTERESTS: &[&str] = &[
    "Movies", "Sports", "Art", "Music", "Travel", "Reading", "Hiking", "Photography",
    "Cooking", "Gaming", "Yoga", "Dancing", "Fashion", "Writing", "Fitness", "Meditation",
    "Camping", "Skiing", "Languages", "Cycling", "Painting", "Volunteering", "Astronomy",
    "Gardening", "Podcasts",
];

const PROMPTS: &[&str] = &[
    "A shower thought I recently had...",
    "My most irrational fear is...",
    "I get along best with people who...",
    "Dating me is like...",
    "The hallmark of a good relationship is...",
    "Don't hate me if I...",
    "Truth or dare?",
    "I go crazy for...",
    "I know the best spot in town for...",
    "My love language is...",
    "One thing I'll never do again...",
    "Let's make sure to...",
    "I'm overly competitive about...",
    "The last time I cried...",
    "My ideal weekend includes...",
    "I want someone who...",
    "I'm known for...",
    "My biggest date fail...",
    "Change my mind about...",
    "Unusual skills:",
    "Green flags I look for...",
    "The way to win me over is...",
    "My greatest strength...",
    "Most spontaneous thing I've done...",
    "We'll get along if...",
];

const PERSONALITIES: &[&str] = &[
    "Extroverted adventurer who loves thrills and risk. Spontaneous, energetic, sometimes overwhelming, always genuine.",
    "Analytical introvert who prefers deep one-on-one conversations. Values logic and quiet reflection, reserved at first but opinionated.",
    "Creative free spirit with eccentric tastes. Imaginative, finds beauty in unusual places, flaky about plans but passionate about interests.",
    "Ambitious, career-driven professional. Values structure and achievement, struggles with work-life balance but is loyal and reliable.",
    "Nurturing empath who puts others' feelings first. Compassionate and supportive, needs a partner who reciprocates emotionally.",
    "Witty comedian who leads with humor. Quick with jokes, sometimes to dodge vulnerability, and values lightness in every situation.",
    "Spiritual seeker focused on growth and mindfulness. Values authenticity and emotional awareness, drawn to alternative lifestyles.",
    "Practical homebody who values stability and comfort. Prefers quiet nights in, grounded and reliable but slow to embrace change.",
    "Socially conscious activist driven to make the world better. Strong convictions guide every choice, intense about social causes.",
    "Refined aesthete with a taste for luxury. Cultured and sophisticated with high standards, selective and unapologetic about it.",
];

const FALLBACK_ANSWERS: [&str; 3] = [
    "I'll answer this soon!",
    "Still thinking about this one...",
    "Ask me about this!",
];

const MISSING_ANSWER: &str = "Sorry, I'll fill this in later!";

const PROMPTS_PER_PROFILE: usize = 3;

const PROFILE_SYSTEM_PROMPT: &str = "You are creating dating profile answers for a dating app. \
Write authentic, interesting responses based on the personality description provided. \
Keep each answer brief (1-3 sentences) and conversational, as if written by the user. \
All answers should reflect the described traits and sound like the same person.";

/// Everything about a profile except its prompt answers
#[derive(Debug, Clone)]
pub struct ProfileDraft {
    pub id: u32,
    pub name: String,
    pub age: u8,
    pub bio: String,
    pub interests: Vec<String>,
    pub personality: String,
    pub prompts: Vec<String>,
}

impl ProfileDraft {
    fn into_profile(self, prompt_answers: Vec<PromptAnswer>) -> Profile {
        Profile {
            id: self.id,
            name: self.name,
            age: self.age,
            bio: self.bio,
            interests: self.interests,
            personality: self.personality,
            prompt_answers,
        }
    }
}

/// Randomly assemble `count` profile drafts with ids `0..count`
pub fn draft_profiles<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<ProfileDraft> {
    let mut personalities: Vec<&str> = PERSONALITIES.to_vec();
    while personalities.len() < count {
        if let Some(&extra) = PERSONALITIES.choose(rng) {
            personalities.push(extra);
        }
    }
    personalities.shuffle(rng);

    (0..count)
        .map(|i| {
            let interest_count = rng.gen_range(3..=5);
            ProfileDraft {
                id: i as u32,
                name: format!("{}{}", NAMES[i % NAMES.len()], i),
                age: rng.gen_range(20..=40),
                bio: BIOS.choose(rng).copied().unwrap_or_default().to_string(),
                interests: INTERESTS
                    .choose_multiple(rng, interest_count)
                    .map(|s| s.to_string())
                    .collect(),
                personality: personalities[i % personalities.len()].to_string(),
                prompts: PROMPTS
                    .choose_multiple(rng, PROMPTS_PER_PROFILE)
                    .map(|s| s.to_string())
                    .collect(),
            }
        })
        .collect()
}

/// Canned answers used when the language model is unavailable
pub fn fallback_answers(prompts: &[String]) -> Vec<PromptAnswer> {
    prompts
        .iter()
        .zip(FALLBACK_ANSWERS.iter())
        .map(|(prompt, answer)| PromptAnswer {
            prompt: prompt.clone(),
            answer: answer.to_string(),
        })
        .collect()
}

/// Extract prompt answers from a model reply
///
/// Tries the JSON array between the first `[` and the last `]`, then the
/// whole reply as JSON, and finally locates each prompt in the raw text and
/// takes everything up to the next prompt as its answer.
pub fn parse_prompt_answers(reply: &str, prompts: &[String]) -> Vec<PromptAnswer> {
    if let (Some(start), Some(end)) = (reply.find('['), reply.rfind(']')) {
        if start < end {
            if let Ok(answers) = serde_json::from_str::<Vec<PromptAnswer>>(&reply[start..=end]) {
                return answers;
            }
        }
    }

    if let Ok(answers) = serde_json::from_str::<Vec<PromptAnswer>>(reply) {
        return answers;
    }

    prompts
        .iter()
        .enumerate()
        .map(|(i, prompt)| {
            let answer = reply
                .find(prompt.as_str())
                .map(|at| {
                    let rest = &reply[at + prompt.len()..];
                    let end = prompts
                        .get(i + 1)
                        .and_then(|next| rest.find(next.as_str()))
                        .unwrap_or(rest.len());
                    rest[..end].trim().to_string()
                })
                .filter(|answer| !answer.is_empty())
                .unwrap_or_else(|| MISSING_ANSWER.to_string());

            PromptAnswer {
                prompt: prompt.clone(),
                answer,
            }
        })
        .collect()
}

/// Generates synthetic profiles, asking the language model for prompt answers
pub struct ProfileGenerator {
    llm: Arc<dyn ChatCompletion>,
}

impl ProfileGenerator {
    pub fn new(llm: Arc<dyn ChatCompletion>) -> Self {
        Self { llm }
    }

    pub async fn generate(&self, count: usize) -> Vec<Profile> {
        // Drafting finishes before any await so the RNG never crosses one
        let drafts = draft_profiles(count, &mut rand::thread_rng());

        let mut profiles = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let answers = self.prompt_answers(&draft).await;
            profiles.push(draft.into_profile(answers));
        }

        tracing::info!("Generated {} user profiles", profiles.len());
        profiles
    }

    async fn prompt_answers(&self, draft: &ProfileDraft) -> Vec<PromptAnswer> {
        let prompt_list = draft.prompts.join("\n");
        let request = ChatRequest {
            system: PROFILE_SYSTEM_PROMPT.to_string(),
            user: format!(
                "Personality description: {}\n\n\
                 Please write responses to the following prompts for this dating profile:\n\
                 {}\n\n\
                 Format your response as a JSON array of objects with 'prompt' and 'answer' fields.",
                draft.personality, prompt_list
            ),
            max_tokens: 500,
            temperature: 0.7,
        };

        match self.llm.complete(request).await {
            Ok(reply) => parse_prompt_answers(&reply, &draft.prompts),
            Err(e) => {
                tracing::warn!("Error generating prompt answers for {}: {}", draft.name, e);
                fallback_answers(&draft.prompts)
            }
        }
    }
}
