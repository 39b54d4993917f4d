//! Skill badge recipes
//!
//! Lettered badges (TypeScript, Node.js, C, Rust, Python) live in `badges`;
//! pictorial emblems (React, databases, design, AI, networking) in `emblems`.

mod badges;
mod emblems;

use crate::recipe::Recipe;

/// All skill badges, in display order
pub const SKILLS: &[Recipe] = &[
    Recipe {
        name: "react",
        title: "React",
        generate: emblems::react,
        compression: None,
    },
    Recipe {
        name: "typescript",
        title: "TypeScript",
        generate: badges::typescript,
        compression: None,
    },
    Recipe {
        name: "nodejs",
        title: "Node.js",
        generate: badges::nodejs,
        compression: None,
    },
    Recipe {
        name: "database",
        title: "Databases",
        generate: emblems::database,
        compression: None,
    },
    Recipe {
        name: "design",
        title: "Design",
        generate: emblems::design,
        compression: None,
    },
    Recipe {
        name: "ai",
        title: "AI",
        generate: emblems::ai,
        compression: None,
    },
    Recipe {
        name: "c",
        title: "C",
        generate: badges::c,
        compression: None,
    },
    Recipe {
        name: "rust",
        title: "Rust",
        generate: badges::rust,
        compression: None,
    },
    Recipe {
        name: "python",
        title: "Python",
        generate: badges::python,
        compression: None,
    },
    Recipe {
        name: "networking",
        title: "Networking",
        generate: emblems::networking,
        compression: None,
    },
];
