//! Notion API types.

mod block;
mod list;
mod page;
mod rich_text;

pub use block::{
    Block, BlockKind, CalloutBlock, ChildPageBlock, CodeBlock, EquationBlock, FileUrl, Icon,
    LinkBlock, MediaBlock, RawBlock, TableBlock, TableRowBlock, TextBlock, ToDoBlock,
};
pub use list::{
    CheckboxCondition, DatabaseQuery, PaginatedList, PropertyFilter, Sort, SortDirection,
};
pub use page::{DateValue, FileProperty, Page, PropertyValue, SelectOption};
pub use rich_text::{Annotations, Equation, RichText, plain_text};
