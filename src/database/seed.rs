use crate::models::Activity;

// Board contents at process start.
pub fn default_activities() -> Vec<(&'static str, Activity)> {
    vec![
        (
            "Chess Club",
            Activity::new(
                "Learn strategies and compete in chess tournaments",
                "Fridays, 3:30 PM - 5:00 PM",
                12,
            )
            .with_participants(["michael@mergington.edu", "daniel@mergington.edu"]),
        ),
        (
            "Programming Class",
            Activity::new(
                "Learn programming fundamentals and build software projects",
                "Tuesdays and Thursdays, 3:30 PM - 4:30 PM",
                20,
            )
            .with_participants(["emma@mergington.edu", "sophia@mergington.edu"]),
        ),
        (
            "Gym Class",
            Activity::new(
                "Physical education and sports activities",
                "Mondays, Wednesdays, Fridays, 2:00 PM - 3:00 PM",
                30,
            )
            .with_participants(["john@mergington.edu", "olivia@mergington.edu"]),
        ),
        (
            "Soccer Team",
            Activity::new(
                "Join the school soccer team and compete in matches",
                "Tuesdays and Thursdays, 4:00 PM - 5:30 PM",
                22,
            )
            .with_participants(["liam@mergington.edu", "noah@mergington.edu"]),
        ),
        (
            "Basketball Club",
            Activity::new(
                "Practice basketball skills and play friendly games",
                "Wednesdays, 3:30 PM - 5:00 PM",
                15,
            )
            .with_participants(["ava@mergington.edu", "mia@mergington.edu"]),
        ),
        (
            "Art Club",
            Activity::new(
                "Explore painting, drawing, and other visual arts",
                "Mondays, 3:30 PM - 5:00 PM",
                15,
            )
            .with_participants(["amelia@mergington.edu", "harper@mergington.edu"]),
        ),
        (
            "Drama Society",
            Activity::new(
                "Act, direct, and produce plays and performances",
                "Thursdays, 3:30 PM - 5:30 PM",
                20,
            )
            .with_participants(["ella@mergington.edu", "scarlett@mergington.edu"]),
        ),
        (
            "Math Olympiad",
            Activity::new(
                "Solve challenging problems and prepare for math competitions",
                "Tuesdays, 3:30 PM - 4:30 PM",
                10,
            )
            .with_participants(["james@mergington.edu", "benjamin@mergington.edu"]),
        ),
        (
            "Science Club",
            Activity::new(
                "Conduct experiments and explore scientific concepts",
                "Wednesdays, 3:30 PM - 5:00 PM",
                16,
            )
            .with_participants(["charlotte@mergington.edu", "henry@mergington.edu"]),
        ),
    ]
}
