//! Selectable languages, their display versions and starter templates.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    Python,
    Java,
    TypeScript,
    Cpp,
    Kotlin,
}

impl Language {
    /// Every selectable language, in menu order.
    pub const ALL: [Language; 6] = [
        Language::JavaScript,
        Language::Python,
        Language::Java,
        Language::TypeScript,
        Language::Cpp,
        Language::Kotlin,
    ];

    /// Identifier understood by the execution service.
    pub fn id(self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Java => "java",
            Language::TypeScript => "typescript",
            Language::Cpp => "cpp",
            Language::Kotlin => "kotlin",
        }
    }

    /// Version label shown next to the language in the selector.
    pub fn display_version(self) -> &'static str {
        match self {
            Language::JavaScript => "ES2023",
            Language::Python => "3.10",
            Language::Java => "17",
            Language::TypeScript => "5.0",
            Language::Cpp => "C++20",
            Language::Kotlin => "1.8.20",
        }
    }

    pub fn starter_template(self) -> &'static str {
        match self {
            Language::JavaScript => JAVASCRIPT_TEMPLATE,
            Language::Python => PYTHON_TEMPLATE,
            Language::Java => JAVA_TEMPLATE,
            Language::TypeScript => TYPESCRIPT_TEMPLATE,
            Language::Cpp => CPP_TEMPLATE,
            Language::Kotlin => KOTLIN_TEMPLATE,
        }
    }

    /// File name used when the editor buffer is saved to disk.
    pub fn download_file_name(self) -> String {
        match self {
            Language::JavaScript => "code.js".to_string(),
            other => format!("code.{}", other.id()),
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::JavaScript
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Picks the starting language: the command line first, then the configured
/// default, then [`Language::default`]. An unparsable configured value is ignored.
pub fn resolve(requested: Option<Language>, configured: Option<&str>) -> Language {
    requested
        .or_else(|| configured.and_then(|l| l.parse().ok()))
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language '{0}' (expected one of: javascript, python, java, typescript, cpp, kotlin)")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "javascript" | "js" => Ok(Language::JavaScript),
            "python" | "py" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "cpp" | "c++" => Ok(Language::Cpp),
            "kotlin" | "kt" => Ok(Language::Kotlin),
            _ => Err(UnknownLanguage(s.to_string())),
        }
    }
}

const JAVASCRIPT_TEMPLATE: &str = r#"// Basic JavaScript Example
function calculateSum(a, b) {
  return a + b;
}

console.log("Sum:", calculateSum(5, 3));"#;

const PYTHON_TEMPLATE: &str = r#"# Python Example with Type Hints
def calculate_sum(a: int, b: int) -> int:
    """Returns the sum of two numbers"""
    return a + b

if __name__ == "__main__":
    print("Sum:", calculate_sum(5, 3))"#;

const JAVA_TEMPLATE: &str = r#"// Java Example with Simple Sum
public class Main {
    public static void main(String[] args) {
        int a = 5;
        int b = 3;
        int sum = a + b;
        System.out.println("Sum: " + sum);
    }
}"#;

const TYPESCRIPT_TEMPLATE: &str = r#"// TypeScript Example with Interface
interface Calculator {
  (a: number, b: number): number;
}

const sum: Calculator = (a, b) => a + b;

console.log("Sum:", sum(5, 3));"#;

const CPP_TEMPLATE: &str = r#"// C++ Example with Modern Syntax
#include <iostream>
using namespace std;

int calculate_sum(int a, int b) {
    return a + b;
}

int main() {
    cout << "Sum: " << calculate_sum(5, 3) << endl;
    return 0;
}"#;

const KOTLIN_TEMPLATE: &str = r#"// Kotlin Example with Null Safety
fun calculateSum(a: Int, b: Int): Int {
    return a + b
}

fun main() {
    println("Sum: " + calculateSum(5, 3))
}"#;
