//! Demo content for a fresh cloud database: one profile, two projects and five skills.

use super::literal::inline_params;
use super::remote::RemoteConnection;
use super::value::SqlValue;
use crate::error::DbError;
use tracing::info;

const PROFILE_SQL: &str = "INSERT OR REPLACE INTO profile (id, name, title, bio, email, phone, location, avatar_url, resume_url, linkedin_url, github_url, twitter_url) VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
const PROJECT_SQL: &str = "INSERT INTO projects (title, description, long_description, technologies, github_url, live_url, image_url, featured) VALUES (?, ?, ?, ?, ?, ?, ?, ?)";
const SKILL_SQL: &str = "INSERT INTO skills (name, category, proficiency, icon, years_experience) VALUES (?, ?, ?, ?, ?)";

const PROFILE: [&str; 11] = [
    "Tarin Agarwal",
    "Full-Stack Developer & Game Developer",
    "A passionate full-stack developer with expertise in modern web technologies and game development. I love creating innovative solutions that make a difference.",
    "tarinagarwal@gmail.com",
    "+1 (555) 123-4567",
    "San Francisco, CA",
    "https://images.pexels.com/photos/2379004/pexels-photo-2379004.jpeg?auto=compress&cs=tinysrgb&w=400",
    "https://example.com/resume.pdf",
    "https://www.linkedin.com/in/tarin-agarwal-810793267/",
    "https://github.com/tarinagarwal",
    "https://twitter.com/tarinagarwal",
];

struct SampleProject {
    title: &'static str,
    description: &'static str,
    long_description: &'static str,
    technologies: &'static str,
    github_url: &'static str,
    live_url: &'static str,
    image_url: &'static str,
}

const PROJECTS: [SampleProject; 2] = [
    SampleProject {
        title: "E-Commerce Platform",
        description: "A modern e-commerce platform built with React and Node.js",
        long_description: "A comprehensive e-commerce solution featuring user authentication, product management, shopping cart, payment integration, and admin dashboard. Built with modern technologies for optimal performance and user experience.",
        technologies: "React, Node.js, MongoDB, Stripe",
        github_url: "https://github.com/tarinagarwal/ecommerce",
        live_url: "https://ecommerce-demo.com",
        image_url: "https://images.pexels.com/photos/230544/pexels-photo-230544.jpeg?auto=compress&cs=tinysrgb&w=800",
    },
    SampleProject {
        title: "Task Management App",
        description: "A collaborative task management application",
        long_description: "A full-featured task management application with real-time collaboration, project organization, deadline tracking, and team communication features.",
        technologies: "Vue.js, Express.js, PostgreSQL, Socket.io",
        github_url: "https://github.com/tarinagarwal/taskmanager",
        live_url: "https://taskmanager-demo.com",
        image_url: "https://images.pexels.com/photos/3184291/pexels-photo-3184291.jpeg?auto=compress&cs=tinysrgb&w=800",
    },
];

/// (name, category, proficiency, icon, years of experience)
const SKILLS: [(&str, &str, i64, &str, i64); 5] = [
    ("React", "Frontend", 90, "Code", 3),
    ("Node.js", "Backend", 85, "Server", 3),
    ("MongoDB", "Database", 80, "Database", 2),
    ("TypeScript", "Frontend", 85, "Code", 2),
    ("PostgreSQL", "Database", 75, "Database", 2),
];

/// Inserts the demo rows; stops at the first failing statement.
///
/// Returns the number of statements executed.
pub async fn seed_sample(remote: &dyn RemoteConnection) -> Result<usize, DbError> {
    let mut statements = Vec::with_capacity(1 + PROJECTS.len() + SKILLS.len());

    let profile: Vec<SqlValue> = PROFILE.iter().map(|v| (*v).into()).collect();
    statements.push(inline_params(PROFILE_SQL, &profile)?);

    for p in &PROJECTS {
        let params: [SqlValue; 8] = [
            p.title.into(),
            p.description.into(),
            p.long_description.into(),
            p.technologies.into(),
            p.github_url.into(),
            p.live_url.into(),
            p.image_url.into(),
            true.into(),
        ];
        statements.push(inline_params(PROJECT_SQL, &params)?);
    }

    for (name, category, proficiency, icon, years) in SKILLS {
        let params: [SqlValue; 5] = [
            name.into(),
            category.into(),
            proficiency.into(),
            icon.into(),
            years.into(),
        ];
        statements.push(inline_params(SKILL_SQL, &params)?);
    }

    for sql in &statements {
        remote.execute(sql).await?;
    }
    info!(
        profiles = 1,
        projects = PROJECTS.len(),
        skills = SKILLS.len(),
        "Sample data added"
    );
    Ok(statements.len())
}
