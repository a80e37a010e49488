//! Prompt for extracting structured requirements from a raw JD.

pub const JD_EXTRACT_PROMPT: &str = "\
You are an expert HR Recruiter. Extract requirements from the Job Description below.
Return ONLY a valid JSON object. Do NOT include any markdown formatting, python code, or explanations.

Job Description:
{jd_text}

Output JSON with specific keys: job_title (str), required_skills (list), tools_tech (list), min_experience (str), responsibilities (list), must_have (list), good_to_have (list).
";
