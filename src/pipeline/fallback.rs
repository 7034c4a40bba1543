use crate::models::repository::RepositoryRef;

/// Generic documentation used when repository analysis or generation fails.
/// Depends only on the repository reference.
pub fn fallback_document(repo: &RepositoryRef) -> String {
    let full_name = repo.full_name();
    let name = &repo.repo;
    let owner = &repo.owner;

    format!(
        "# {name}

> AI-generated documentation for **{full_name}**

## Overview
This repository contains the source code for {name}. This documentation was generated automatically when detailed analysis was not available.

## Quick Start

### Installation

```bash
# Clone the repository
git clone https://github.com/{full_name}.git
cd {name}

# Install dependencies (if applicable)
npm install
# or
yarn install
# or
pip install -r requirements.txt
```

### Basic Usage

```bash
# Run the application
npm start
# or
python main.py
# or
./run.sh
```

## Repository Information

- **Repository**: [{full_name}](https://github.com/{full_name})
- **Owner**: {owner}
- **Project**: {name}

## Contributing

1. Fork the repository
2. Create your feature branch (`git checkout -b feature/amazing-feature`)
3. Commit your changes (`git commit -m 'Add some amazing feature'`)
4. Push to the branch (`git push origin feature/amazing-feature`)
5. Open a Pull Request

## License

Please check the repository for license information.

## Support

For support and questions, please visit the [GitHub repository](https://github.com/{full_name}) and create an issue.

---

*This documentation was generated automatically. For more detailed information, please refer to the actual repository files and README.*"
    )
}
