//! Prompts for the intake stage.

pub const RESUME_BATCH_PROMPT: &str = "\
You are an expert Resume Parser. You are provided with a batch of {count} resumes text below.
Extract the information for EACH resume and return a JSON object containing a list of resumes.
Ensure the order matches the input order precisely.
If a field is not found, use empty string \"\".

Resume Batch Content:
{text}

Return ONLY a raw JSON object. Do not include markdown formatting (like ```json).
Output JSON: {\"resumes\": [{\"Name\": str, \"Contact\": str, \"Qualification\": str, \"Current_Position\": str, \"Experience\": str, \"Skills\": str, \"Top_Projects\": str}, ...]}
";

pub const FOLDER_MATCH_PROMPT: &str = "\
You are an intelligent HR folder matching assistant.
User is searching for resumes for the role: \"{job_title}\".

Your task: Select the SINGLE BEST matching folder from the list below that would likely contain relevant resumes.

MATCHING RULES (in order of priority):
1. Exact Match: If a folder name contains the exact job title, return it.
2. Semantic Match: Consider semantically similar roles (e.g. \"HR Assistant\" matches \"HR Executive\" or \"HR Coordinator\").
3. Hierarchical Match: Include senior/junior variations of the same role.
4. Avoid Generic Folders: Skip folders like \"General\", \"Archive\", \"Invoices\".
5. Most Recent First: If multiple similar folders exist, prefer the most recent one based on the date in the folder name.

Folders Available:
{folders_list}

Return ONLY a JSON list with THE SINGLE BEST matching folder name.
Example: [\"HR Executive Dec 2024\"]

CRITICAL: Return exactly ONE folder name (the best match). Do NOT return multiple folders.
If NO folders are semantically related, return an empty list: []
";
