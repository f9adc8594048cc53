use crate::models::{ConversationSet, Profile};
use crate::services::llm::{ChatCompletion, ChatRequest};
use std::sync::Arc;

/// Conversations with fewer usable lines than this are replaced
const MIN_MESSAGES: usize = 2;

const CONVERSATION_SYSTEM_PROMPT: &str = "You are simulating a casual conversation between two people \
on a dating app. Write in a natural, relaxed tone with occasional slang, abbreviations and emojis. \
Keep each message to 1-3 sentences, reference the users' interests and backgrounds, and let each \
message build on the previous one.";

/// Generates pairwise conversations between profiles
pub struct ConversationSimulator {
    llm: Arc<dyn ChatCompletion>,
    messages_per_conversation: usize,
}

impl ConversationSimulator {
    pub fn new(llm: Arc<dyn ChatCompletion>, messages_per_conversation: usize) -> Self {
        Self {
            llm,
            messages_per_conversation,
        }
    }

    /// Simulate one conversation for every unordered pair, in profile order
    pub async fn simulate_all(&self, profiles: &[Profile]) -> ConversationSet {
        let mut conversations = ConversationSet::new();

        for (i, user_a) in profiles.iter().enumerate() {
            for user_b in &profiles[i + 1..] {
                if user_a.id == user_b.id || conversations.contains(user_a.id, user_b.id) {
                    continue;
                }

                tracing::debug!("Simulating conversation between {} and {}", user_a.name, user_b.name);
                let messages = self.simulate_pair(user_a, user_b).await;
                conversations.insert(user_a.id, user_b.id, messages);
            }
        }

        tracing::info!("Simulated {} conversations", conversations.len());
        conversations
    }

    /// Simulate a conversation started by `user_a`
    ///
    /// Falls back to a short scripted exchange when the model fails or
    /// returns fewer than two usable lines.
    pub async fn simulate_pair(&self, user_a: &Profile, user_b: &Profile) -> Vec<String> {
        let request = ChatRequest {
            system: CONVERSATION_SYSTEM_PROMPT.to_string(),
            user: self.conversation_prompt(user_a, user_b),
            max_tokens: 600,
            temperature: 0.8,
        };

        match self.llm.complete(request).await {
            Ok(reply) => {
                let lines = parse_conversation(&reply);
                if lines.len() < MIN_MESSAGES {
                    tracing::warn!(
                        "Model returned {} usable lines for {} and {}, using placeholder",
                        lines.len(),
                        user_a.name,
                        user_b.name
                    );
                    placeholder_conversation(user_a, user_b)
                } else {
                    lines
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Error simulating conversation between {} and {}: {}",
                    user_a.name,
                    user_b.name,
                    e
                );
                placeholder_conversation(user_a, user_b)
            }
        }
    }

    fn conversation_prompt(&self, user_a: &Profile, user_b: &Profile) -> String {
        let per_user = self.messages_per_conversation / 2;
        format!(
            "Simulate a casual dating app conversation between these two users:\n\n\
             User 1: {}, {} years old\nBio: {}\nInterests: {}\n\n\
             User 2: {}, {} years old\nBio: {}\nInterests: {}\n\n\
             Generate a natural {}-message conversation ({} from each user, alternating) \
             where they get to know each other. User 1 messages first. \
             Format each message as \"Name: message text\".",
            user_a.name,
            user_a.age,
            user_a.bio,
            user_a.interests.join(", "),
            user_b.name,
            user_b.age,
            user_b.bio,
            user_b.interests.join(", "),
            self.messages_per_conversation,
            per_user,
        )
    }
}

/// Keep the trimmed, non-empty lines of a reply that contain a colon
pub fn parse_conversation(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.contains(':'))
        .map(String::from)
        .collect()
}

/// Scripted six-line exchange between two profiles
pub fn placeholder_conversation(user_a: &Profile, user_b: &Profile) -> Vec<String> {
    let interest_a = user_a
        .interests
        .first()
        .map(String::as_str)
        .unwrap_or("cool stuff");
    let interest_b = user_b
        .interests
        .first()
        .map(String::as_str)
        .unwrap_or("anything fun");

    vec![
        format!("{}: Hey {}, how's it going?", user_a.name, user_b.name),
        format!("{}: Hey {}, I'm good! How are you?", user_b.name, user_a.name),
        format!("{}: Doing pretty well. I saw you're into {}?", user_a.name, interest_a),
        format!(
            "{}: Yeah! Been into that for a while. Do you like {}?",
            user_b.name, interest_b
        ),
        format!("{}: Absolutely! We should hang out sometime.", user_a.name),
        format!("{}: Sounds good to me!", user_b.name),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::llm::LlmError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedLlm {
        reply: Result<&'static str, ()>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatCompletion for ScriptedLlm {
        async fn complete(&self, _request: ChatRequest) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(String::from)
                .map_err(|_| LlmError::InvalidResponse("scripted failure".to_string()))
        }
    }

    fn simulator(reply: Result<&'static str, ()>) -> (ConversationSimulator, Arc<ScriptedLlm>) {
        let llm = Arc::new(ScriptedLlm {
            reply,
            calls: AtomicUsize::new(0),
        });
        (ConversationSimulator::new(llm.clone(), 8), llm)
    }

    fn profile(id: u32, name: &str, interests: &[&str]) -> Profile {
        Profile {
            id,
            name: name.to_string(),
            age: 30,
            bio: "Dog parent, coffee addict".to_string(),
            interests: interests.iter().map(|s| s.to_string()).collect(),
            personality: "Witty comedian".to_string(),
            prompt_answers: vec![],
        }
    }

    #[test]
    fn test_parse_conversation_filters_lines() {
        let reply = "Here is the chat\n\n  Alex0: hey!  \nSam1: hi :)\n---\n";
        assert_eq!(parse_conversation(reply), vec!["Alex0: hey!", "Sam1: hi :)"]);
    }

    #[test]
    fn test_placeholder_uses_names_and_interests() {
        let a = profile(0, "Alex0", &["Hiking"]);
        let b = profile(1, "Sam1", &[]);
        let lines = placeholder_conversation(&a, &b);

        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "Alex0: Hey Sam1, how's it going?");
        assert!(lines[2].ends_with("into Hiking?"));
        assert!(lines[3].ends_with("Do you like anything fun?"));
    }

    #[tokio::test]
    async fn test_simulate_all_covers_each_pair_once() {
        let (sim, llm) = simulator(Ok("A: hi\nB: hello"));
        let profiles = vec![
            profile(0, "A", &["Art"]),
            profile(1, "B", &["Yoga"]),
            profile(2, "C", &["Music"]),
            profile(3, "D", &["Travel"]),
        ];

        let conversations = sim.simulate_all(&profiles).await;

        assert_eq!(conversations.len(), 6);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 6);
        let first = conversations.first().unwrap();
        assert_eq!((first.user_a_id, first.user_b_id), (0, 1));
        assert!(conversations.contains(3, 2));
    }

    #[tokio::test]
    async fn test_short_reply_uses_placeholder() {
        let (sim, _) = simulator(Ok("just one line: here"));
        let a = profile(0, "Alex0", &["Art"]);
        let b = profile(1, "Sam1", &["Yoga"]);

        let lines = sim.simulate_pair(&a, &b).await;
        assert_eq!(lines, placeholder_conversation(&a, &b));
    }

    #[tokio::test]
    async fn test_model_failure_uses_placeholder() {
        let (sim, _) = simulator(Err(()));
        let a = profile(0, "Alex0", &["Art"]);
        let b = profile(1, "Sam1", &["Yoga"]);

        let lines = sim.simulate_pair(&a, &b).await;
        assert_eq!(lines.len(), 6);
    }
}
