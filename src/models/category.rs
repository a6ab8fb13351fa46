use serde::{Deserialize, Serialize};

/// Category a post can be filed under. Posts link to categories many-to-many.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

impl CreateCategoryRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Category name cannot be empty".to_string());
        }

        if self.name.trim().len() > 100 {
            return Err("Category name cannot exceed 100 characters".to_string());
        }

        Ok(())
    }

    pub fn get_normalized_name(&self) -> String {
        self.name.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_category_request_validation() {
        assert!(CreateCategoryRequest { name: "Travel".to_string() }.validate().is_ok());
        assert!(CreateCategoryRequest { name: "".to_string() }.validate().is_err());
        assert!(CreateCategoryRequest { name: "x".repeat(101) }.validate().is_err());
    }

    #[test]
    fn test_normalized_name() {
        let request = CreateCategoryRequest { name: "  Food  ".to_string() };
        assert_eq!(request.get_normalized_name(), "Food");
    }
}
