//! Reply tables for the offline responder

/// A canned answer about one subject
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    /// Any of these found in the subject selects the entry
    pub keywords: &'static [&'static str],
    pub reply: &'static str,
}

pub const GREETINGS: &[&str] = &[
    "Hello! It's great to hear from you. How are you doing today?",
    "Hi there! I'm glad you stopped by. What's on your mind?",
    "Hey! Nice to meet you. How can I help you today?",
    "Hello! I'm here and ready to chat. What would you like to talk about?",
];

pub const HELP_REPLIES: &[&str] = &[
    "I'm happy to help! Tell me what you're working on and I'll do my best.",
    "Of course, I can assist with that. What exactly do you need?",
    "I'm here to support you. Could you describe the problem in a bit more detail?",
];

pub const GENERIC_REPLIES: &[&str] = &[
    "That's really interesting! Could you tell me more about that?",
    "I find that fascinating! What's your experience with that?",
    "That's a great topic! What made you think of that?",
    "I'd love to learn more about your perspective on that.",
    "That sounds intriguing! Can you elaborate on that?",
    "That's worth discussing! What's your take on it?",
];

/// Known people for "who is" questions
pub const PEOPLE: &[Entry] = &[
    Entry {
        keywords: &["flash"],
        reply: "The Flash is a DC Comics superhero known for super speed! Barry Allen, the best \
            known Flash, is a forensic scientist who got his powers from a lightning strike. He \
            is a founding member of the Justice League.",
    },
    Entry {
        keywords: &["superman"],
        reply: "Superman is Kal-El from the planet Krypton, raised on Earth as Clark Kent. He can \
            fly, has super strength and heat vision, and works as a reporter at the Daily Planet \
            while protecting Metropolis.",
    },
    Entry {
        keywords: &["batman"],
        reply: "Batman is Bruce Wayne, a Gotham City billionaire who trained himself to be a \
            master detective and fighter. He has no superpowers, only skill, gadgets and \
            determination.",
    },
    Entry {
        keywords: &["spider-man", "spiderman"],
        reply: "Spider-Man is Peter Parker, who gained spider-like powers after a radioactive \
            spider bite. He sticks to walls, shoots webs and lives by the motto 'With great power \
            comes great responsibility'.",
    },
    Entry {
        keywords: &["einstein"],
        reply: "Albert Einstein was one of the greatest physicists in history! He developed the \
            theory of relativity, gave us E=mc², and won the Nobel Prize in Physics in 1921.",
    },
    Entry {
        keywords: &["shakespeare"],
        reply: "William Shakespeare was an English playwright and poet, often called the greatest \
            writer in the English language. He wrote 'Hamlet', 'Macbeth' and 'Romeo and Juliet'.",
    },
    Entry {
        keywords: &["steve jobs"],
        reply: "Steve Jobs co-founded Apple and led it for many years. He helped bring the Mac, \
            iPod, iPhone and iPad to the world and was known for his focus on design.",
    },
    Entry {
        keywords: &["elon musk"],
        reply: "Elon Musk is an entrepreneur who runs Tesla and SpaceX. He is known for ambitious \
            goals around electric cars and space travel.",
    },
];

/// Known concepts for "what is" questions
pub const CONCEPTS: &[Entry] = &[
    Entry {
        keywords: &["gravity"],
        reply: "Gravity is the force that pulls objects with mass toward each other! It keeps us \
            on the ground, and Einstein showed that it is really a curving of space and time.",
    },
    Entry {
        keywords: &["photosynthesis"],
        reply: "Photosynthesis is how plants make food from sunlight. They combine carbon dioxide \
            and water into glucose and release oxygen along the way.",
    },
    Entry {
        keywords: &["dna"],
        reply: "DNA is the instruction manual for living things. It is a double helix found in \
            the nucleus of every cell and carries the genetic code of an organism.",
    },
];

/// Known processes for "how to" questions
pub const PROCESSES: &[Entry] = &[
    Entry {
        keywords: &["fly", "airplane"],
        reply: "Airplanes fly thanks to four forces: lift, weight, thrust and drag. The wing shape \
            makes air move faster over the top, which creates lift. When lift beats weight, the \
            plane flies!",
    },
    Entry {
        keywords: &["internet work", "wifi work"],
        reply: "The internet is a huge network of connected computers. Your device splits data \
            into small packets that travel different routes and are reassembled at the other end.",
    },
];

pub fn unknown_person(subject: &str) -> String {
    format!(
        "I'm not immediately familiar with {}, but I'd love to learn more! Could you tell me more \
        about them? Are they from entertainment, history, science, or another field?",
        subject
    )
}

pub fn unknown_concept(subject: &str) -> String {
    format!(
        "That's a fascinating question about {}! I'd love to help explain it. Could you be a bit \
        more specific about what aspect you're curious about?",
        subject
    )
}

pub fn unknown_process(subject: &str) -> String {
    format!(
        "That's a great question about {}! I'd be happy to help explain the process. Could you \
        give me more context about what you're trying to understand?",
        subject
    )
}
