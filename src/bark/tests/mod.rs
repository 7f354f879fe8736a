mod test_circle_basic;
mod test_section_basic;
